use std::path::PathBuf;

use exam_archive::domain::{CourseCode, NewPaper, Period};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Subcommand)]
pub enum CourseCommand {
    /// Register a new course
    Add {
        /// The course code, e.g. CT470
        code: CourseCode,

        /// The course title
        name: String,
    },

    /// List every course
    List,
}

impl CourseCommand {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;

        match self {
            Self::Add { code, name } => {
                directory
                    .archive_mut()
                    .catalog_mut()
                    .add_course(code.clone(), name)?;
                directory.flush()?;
                println!("{}", format!("Added course {code}").success());
            }
            Self::List => {
                let catalog = directory.archive().catalog();
                for course in catalog.courses() {
                    let papers = catalog.papers_for(course.id()).len();
                    println!(
                        "{:<8} {} {}",
                        course.code().as_str(),
                        course.name(),
                        format!("({papers} papers)").dim()
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum PaperCommand {
    /// Register a new paper for a course
    Add {
        /// The course code
        code: CourseCode,

        /// The first year of the academic session
        year: i32,

        /// The examination period (summer, winter, autumn, spring)
        period: Period,

        /// The sitting within the period
        #[arg(long, default_value_t = 1)]
        sitting: u32,

        /// The paper's title
        #[arg(long)]
        name: Option<String>,

        /// The last year of the academic session (defaults to YEAR + 1)
        #[arg(long)]
        year_stop: Option<i32>,

        /// Link to the published paper
        #[arg(long)]
        link: Option<String>,
    },

    /// List the papers of a course
    List {
        /// The course code
        code: CourseCode,
    },
}

impl PaperCommand {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;

        match self {
            Self::Add {
                code,
                year,
                period,
                sitting,
                name,
                year_stop,
                link,
            } => {
                let name = name.unwrap_or_else(|| format!("{code} {period} {year}"));
                directory.archive_mut().catalog_mut().add_paper(NewPaper {
                    course: code.clone(),
                    name,
                    period,
                    sitting,
                    year_start: year,
                    year_stop,
                    link,
                })?;
                directory.flush()?;
                println!(
                    "{}",
                    format!("Added paper {code}/{year}/{period} (sitting {sitting})").success()
                );
            }
            Self::List { code } => {
                let archive = directory.archive();
                let Some(course) = archive.catalog().course_by_code(&code) else {
                    anyhow::bail!("course {code} not found");
                };
                for paper in archive.catalog().papers_for(course.id()) {
                    let questions = archive.questions().flatten_paper(paper.id()).len();
                    println!(
                        "{}/{}/{}  sitting {}  {} {}",
                        code,
                        paper.year_start(),
                        paper.period(),
                        paper.sitting(),
                        paper.name(),
                        format!("({questions} questions)").dim()
                    );
                }
            }
        }
        Ok(())
    }
}
