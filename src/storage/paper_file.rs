//! YAML records for course and paper files.
//!
//! Records are versioned with a `_version` tag so the on-disk layout can
//! change without breaking existing archives.

use std::{
    fs,
    io::{self, BufReader},
    num::NonZeroUsize,
    path::Path,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Comment, Course, CourseCode, IndexType, MaterializedPath, Paper, PathError, Question,
    QuestionPath, Revision,
};

/// Errors raised while reading or writing a record file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The YAML could not be parsed or rendered.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub(crate) fn read<T>(path: &Path) -> Result<T, FileError>
where
    T: for<'de> Deserialize<'de>,
{
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_yaml::from_reader(reader)?)
}

pub(crate) fn write<T: Serialize>(path: &Path, record: &T) -> Result<(), FileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_yaml::to_string(record)?)?;
    Ok(())
}

/// The contents of `course.yaml`. The course code is the directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub enum CourseFile {
    /// First on-disk version.
    #[serde(rename = "1")]
    V1 {
        /// Course identifier.
        id: Uuid,
        /// Course title.
        name: String,
    },
}

impl CourseFile {
    pub(crate) fn from_course(course: &Course) -> Self {
        Self::V1 {
            id: course.id(),
            name: course.name().to_string(),
        }
    }

    pub(crate) fn into_course(self, code: CourseCode) -> Course {
        match self {
            Self::V1 { id, name } => Course { id, code, name },
        }
    }
}

/// The contents of a paper file.
///
/// Year, period and sitting are taken from the file name; questions are
/// stored flattened in pre-order so that every parent precedes its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_version")]
pub enum PaperFile {
    /// First on-disk version.
    #[serde(rename = "1")]
    V1 {
        /// Paper identifier.
        id: Uuid,
        /// Paper title.
        name: String,
        /// Final year of the academic session.
        year_stop: i32,
        /// Link to the published paper.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        /// Questions in pre-order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        questions: Vec<QuestionRecord>,
        /// Comments on the paper's questions.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        comments: Vec<CommentRecord>,
    },
}

/// A question as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<Uuid>,
    index: NonZeroUsize,
    index_type: IndexType,
    path: QuestionPath,
    formatted_path: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_section: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marks: Option<u32>,
    created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    revisions: Vec<RevisionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    similar: Vec<SimilarRecord>,
}

/// One revision of a question's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    id: Uuid,
    author: String,
    content: String,
    created: DateTime<Utc>,
}

/// An outgoing similar-question link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarRecord {
    /// The question resembled.
    pub question: Uuid,
    /// Similarity score.
    pub score: f64,
}

/// A comment on one of the paper's questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    id: Uuid,
    question: Uuid,
    author: String,
    content: String,
    created: DateTime<Utc>,
}

impl PaperFile {
    pub(crate) fn new(
        paper: &Paper,
        questions: Vec<QuestionRecord>,
        comments: Vec<CommentRecord>,
    ) -> Self {
        Self::V1 {
            id: paper.id(),
            name: paper.name().to_string(),
            year_stop: paper.year_stop(),
            link: paper.link().map(ToString::to_string),
            questions,
            comments,
        }
    }
}

impl QuestionRecord {
    pub(crate) fn new(question: &Question, similar: impl Iterator<Item = (Uuid, f64)>) -> Self {
        Self {
            id: question.id(),
            parent: question.parent(),
            index: question.index(),
            index_type: question.index_type(),
            path: question.path().clone(),
            formatted_path: question.materialized_path().formatted_vec(),
            is_section: question.is_section(),
            marks: question.marks(),
            created: question.created(),
            revision: question.revision,
            revisions: question
                .revisions()
                .iter()
                .map(|revision| RevisionRecord {
                    id: revision.id(),
                    author: revision.author().to_string(),
                    content: revision.content().to_string(),
                    created: revision.created(),
                })
                .collect(),
            similar: similar
                .map(|(question, score)| SimilarRecord { question, score })
                .collect(),
        }
    }

    /// Rebuild the question, keeping the stored path verbatim.
    ///
    /// Only the path lengths are checked here.
    /// [`QuestionTree::restore`](crate::domain::QuestionTree::restore) checks
    /// the record against its index and parent.
    ///
    /// Returns the question together with its outgoing similar links, which
    /// can only be restored once every paper is loaded.
    pub(crate) fn into_question(
        self,
        paper: Uuid,
    ) -> Result<(Question, Vec<SimilarRecord>), PathError> {
        let path = MaterializedPath::from_parts(self.path, self.formatted_path)?;
        let question = Question {
            id: self.id,
            paper,
            parent: self.parent,
            children: Vec::new(),
            index: self.index,
            index_type: self.index_type,
            path,
            is_section: self.is_section,
            marks: self.marks,
            created: self.created,
            revisions: self
                .revisions
                .into_iter()
                .map(|record| Revision {
                    id: record.id,
                    author: record.author,
                    content: record.content,
                    created: record.created,
                })
                .collect(),
            revision: self.revision,
        };
        Ok((question, self.similar))
    }
}

impl From<&Comment> for CommentRecord {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id(),
            question: comment.entity(),
            author: comment.author().to_string(),
            content: comment.content().to_string(),
            created: comment.created(),
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            entity: record.question,
            author: record.author,
            content: record.content,
            created: record.created,
        }
    }
}
