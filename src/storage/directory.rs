//! A filesystem backed exam archive
//!
//! The [`Directory`] loads every course and paper file beneath a root
//! directory into an in-memory [`Archive`], and writes it back on
//! [`Directory::flush`].

use std::{
    ffi::OsStr,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::instrument;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::{
    domain::{
        Archive, Catalog, CatalogError, Comment, Comments, Config, Course, CourseCode, Paper,
        QuestionTree, TreeError,
    },
    storage::{
        paper_file::{self, CommentRecord, CourseFile, FileError, PaperFile, QuestionRecord},
        path_parser::{
            COURSE_FILE, PAPER_EXTENSION, PaperKey, ParseError, construct_course_path,
            construct_paper_path, parse_course_from_path, parse_paper_from_path,
        },
    },
};

/// Name of the metadata directory beneath the archive root.
pub const METADATA_DIR: &str = ".exam";

const CONFIG_FILE: &str = "config.toml";

/// State of a directory whose contents are in memory.
#[derive(Debug)]
pub struct Loaded {
    archive: Archive,
    config: Config,
}

/// State of a directory that has not been read yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unloaded;

/// A filesystem backed exam archive.
#[derive(Debug)]
pub struct Directory<S> {
    /// The root of the directory the archive is stored in.
    root: PathBuf,
    state: S,
}

impl<S> Directory<S> {
    /// The root of the archive.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(METADATA_DIR).join(CONFIG_FILE)
    }
}

impl Directory<Unloaded> {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unloaded,
        }
    }

    /// Create the metadata directory and write `config` to it.
    ///
    /// Returns the path of the new configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the archive is already initialised or the file cannot be
    /// written.
    pub fn init(&self, config: &Config) -> Result<PathBuf, InitError> {
        let metadata = self.root.join(METADATA_DIR);
        if metadata.exists() {
            return Err(InitError::AlreadyInitialised(metadata));
        }
        fs::create_dir_all(&metadata)?;

        let path = self.config_path();
        config.save(&path).map_err(InitError::Config)?;
        tracing::info!("Initialised archive in {}", self.root.display());
        Ok(path)
    }

    /// Load every course and paper from disk.
    ///
    /// Paper files are read in parallel. Question paths are restored exactly
    /// as stored, including stale ancestor segments.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be read, is misnamed, belongs to a
    /// course without a `course.yaml`, or holds inconsistent questions.
    #[instrument(skip(self))]
    pub fn load_all(self) -> Result<Directory<Loaded>, LoadError> {
        let config = load_config(&self.root);
        let (course_paths, paper_paths) = collect_record_paths(&self.root);

        let courses = course_paths
            .par_iter()
            .map(|path| load_course(path))
            .collect::<Result<Vec<_>, _>>()?;
        let mut papers = paper_paths
            .par_iter()
            .map(|path| load_paper(path))
            .collect::<Result<Vec<_>, _>>()?;
        papers.sort_by(|(a, ..), (b, ..)| a.cmp(b));

        let mut catalog = Catalog::default();
        for course in courses {
            catalog.insert_course(course)?;
        }

        let capacity = papers
            .iter()
            .map(|(_, _, PaperFile::V1 { questions, .. })| questions.len())
            .sum();
        let mut tree = QuestionTree::with_capacity(capacity);
        let mut links = Vec::new();
        let mut comments = Vec::new();

        for (key, path, file) in papers {
            let course = catalog
                .course_by_code(&key.course)
                .ok_or_else(|| LoadError::MissingCourse {
                    path: path.clone(),
                    course: key.course.clone(),
                })?
                .id();
            let PaperFile::V1 {
                id,
                name,
                year_stop,
                link,
                questions,
                comments: paper_comments,
            } = file;

            catalog.insert_paper(Paper {
                id,
                course,
                name,
                period: key.period,
                sitting: key.sitting,
                year_start: key.year,
                year_stop,
                link,
            })?;

            for record in questions {
                let (question, similar) =
                    record
                        .into_question(id)
                        .map_err(|source| LoadError::Question {
                            path: path.clone(),
                            source: source.into(),
                        })?;
                let from = question.id();
                tree.restore(question)
                    .map_err(|source| LoadError::Question {
                        path: path.clone(),
                        source,
                    })?;
                links.extend(similar.into_iter().map(|link| (from, link)));
            }
            comments.extend(paper_comments);
        }

        for (from, link) in links {
            tree.add_similar(from, link.question, link.score)
                .map_err(|source| LoadError::Similar { from, source })?;
        }

        let mut archive = Archive::from_parts(catalog, tree, Comments::default());
        for record in comments {
            let comment = Comment::from(record);
            if archive.questions().get(comment.entity()).is_none() {
                return Err(LoadError::OrphanComment {
                    comment: comment.id(),
                    question: comment.entity(),
                });
            }
            archive.restore_comment(comment);
        }

        tracing::debug!(
            "Loaded {} questions from {}",
            archive.questions().len(),
            self.root.display()
        );

        Ok(Directory {
            root: self.root,
            state: Loaded { archive, config },
        })
    }
}

impl Directory<Loaded> {
    /// The loaded archive.
    #[must_use]
    pub const fn archive(&self) -> &Archive {
        &self.state.archive
    }

    /// Mutable access to the loaded archive. Changes are written by
    /// [`Directory::flush`].
    pub const fn archive_mut(&mut self) -> &mut Archive {
        &mut self.state.archive
    }

    /// The archive's configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.state.config
    }

    /// Write every course and paper file, returning the number of files
    /// written.
    ///
    /// # Errors
    ///
    /// This method does *not* fail fast. It attempts to write every file
    /// before reporting the ones that failed.
    #[instrument(skip(self))]
    pub fn flush(&self) -> Result<usize, FlushError> {
        let archive = &self.state.archive;
        let catalog = archive.catalog();

        let courses: Vec<(PathBuf, CourseFile)> = catalog
            .courses()
            .map(|course| {
                (
                    construct_course_path(&self.root, course.code()),
                    CourseFile::from_course(course),
                )
            })
            .collect();

        let papers: Vec<(PathBuf, PaperFile)> = catalog
            .papers()
            .filter_map(|paper| {
                let course = catalog.course(paper.course())?;
                Some((
                    construct_paper_path(&self.root, course.code(), paper),
                    paper_record(archive, paper),
                ))
            })
            .collect();

        let failures: Vec<(PathBuf, FileError)> = courses
            .par_iter()
            .filter_map(|(path, file)| {
                paper_file::write(path, file)
                    .err()
                    .map(|e| (path.clone(), e))
            })
            .chain(papers.par_iter().filter_map(|(path, file)| {
                paper_file::write(path, file)
                    .err()
                    .map(|e| (path.clone(), e))
            }))
            .collect();

        NonEmpty::from_vec(failures).map_or_else(
            || {
                let written = courses.len() + papers.len();
                tracing::debug!("Wrote {written} files to {}", self.root.display());
                Ok(written)
            },
            |failures| Err(FlushError { failures }),
        )
    }
}

/// Errors raised by [`Directory::init`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The metadata directory already exists.
    #[error("archive already initialised (found {})", .0.display())]
    AlreadyInitialised(PathBuf),
    /// The metadata directory could not be created.
    #[error("failed to create metadata directory: {0}")]
    Io(#[from] io::Error),
    /// The configuration file could not be written.
    #[error("{0}")]
    Config(String),
}

/// Errors raised by [`Directory::load_all`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A record file could not be read or parsed.
    #[error("failed to read {}: {source}", path.display())]
    File {
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        source: FileError,
    },

    /// A record file's name does not identify a course or paper.
    #[error("unrecognised file {}: {source}", path.display())]
    FileName {
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        source: ParseError,
    },

    /// A paper was found in a directory without a `course.yaml`.
    #[error("{} belongs to course {course}, which has no course.yaml", path.display())]
    MissingCourse {
        /// The paper file.
        path: PathBuf,
        /// The course it names.
        course: CourseCode,
    },

    /// Two files describe the same course or paper.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A stored question is inconsistent.
    #[error("invalid question in {}: {source}", path.display())]
    Question {
        /// The paper file.
        path: PathBuf,
        /// What went wrong.
        source: TreeError,
    },

    /// A stored similar-question link is invalid.
    #[error("invalid similar link from {from}: {source}")]
    Similar {
        /// The question holding the link.
        from: Uuid,
        /// What went wrong.
        source: TreeError,
    },

    /// A comment refers to a question that does not exist.
    #[error("comment {comment} refers to unknown question {question}")]
    OrphanComment {
        /// The comment.
        comment: Uuid,
        /// The missing question.
        question: Uuid,
    },
}

/// Errors raised by [`Directory::flush`].
#[derive(Debug, thiserror::Error)]
pub struct FlushError {
    failures: NonEmpty<(PathBuf, FileError)>,
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        write!(f, "failed to write archive: ")?;

        let total = self.failures.len();

        let displayed_paths: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|(p, _e)| p.display().to_string())
            .collect();

        let msg = displayed_paths.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join(METADATA_DIR).join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

/// Course and paper files, found exactly one directory below the root.
fn collect_record_paths(root: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            !entry
                .path()
                .components()
                .any(|c| c.as_os_str() == METADATA_DIR)
        })
        .filter(|entry| entry.path().extension() == Some(OsStr::new(PAPER_EXTENSION)))
        .map(walkdir::DirEntry::into_path)
        .partition(|path| path.file_name() == Some(OsStr::new(COURSE_FILE)))
}

fn load_course(path: &Path) -> Result<Course, LoadError> {
    let code = parse_course_from_path(path).map_err(|source| LoadError::FileName {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CourseFile = paper_file::read(path).map_err(|source| LoadError::File {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.into_course(code))
}

fn load_paper(path: &Path) -> Result<(PaperKey, PathBuf, PaperFile), LoadError> {
    let key = parse_paper_from_path(path).map_err(|source| LoadError::FileName {
        path: path.to_path_buf(),
        source,
    })?;
    let file = paper_file::read(path).map_err(|source| LoadError::File {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::trace!("Read {}", path.display());
    Ok((key, path.to_path_buf(), file))
}

fn paper_record(archive: &Archive, paper: &Paper) -> PaperFile {
    let questions = archive.questions().flatten_paper(paper.id());

    let comments = questions
        .iter()
        .flat_map(|question| archive.comments().for_entity(question.id()))
        .map(CommentRecord::from)
        .collect();
    let records = questions
        .iter()
        .map(|question| QuestionRecord::new(question, archive.questions().similar(question.id())))
        .collect();

    PaperFile::new(paper, records, comments)
}
