use std::path::PathBuf;

mod catalog;
mod edit;
mod remove;
mod renumber;
mod show;
mod terminal;

use anyhow::Context;
use catalog::{CourseCommand, PaperCommand};
use clap::ArgAction;
use edit::{Add, Comment, Edit, Similar};
use exam_archive::{
    Archive, Config, Directory, QuestionAddress, QuestionPath,
    domain::PaperAddress,
    storage::Loaded,
};
use remove::Remove;
use renumber::{Move, Renumber, Retype};
use show::{History, Show, Tree};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the archive
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Initialize a new archive
    Init,

    /// Manage courses
    #[command(subcommand)]
    Course(CourseCommand),

    /// Manage papers
    #[command(subcommand)]
    Paper(PaperCommand),

    /// Add a question to a paper
    Add(Add),

    /// Show a single question
    Show(Show),

    /// Print the question tree of a paper or question
    Tree(Tree),

    /// List the revisions of a question
    History(History),

    /// Write a new revision of a question
    Edit(Edit),

    /// Change a question's index
    ///
    /// Only the question's own path segment is updated unless `--cascade` is
    /// given or `cascade_renumber` is set in the configuration.
    Renumber(Renumber),

    /// Change the numbering scheme of a question or its sibling group
    Retype(Retype),

    /// Move a question and its subtree within its paper
    Move(Move),

    /// Mark a question as similar to another
    Similar(Similar),

    /// Comment on a question
    Comment(Comment),

    /// Remove a question and its subtree
    Remove(Remove),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init => init(root)?,
            Self::Course(command) => command.run(root)?,
            Self::Paper(command) => command.run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Tree(command) => command.run(root)?,
            Self::History(command) => command.run(root)?,
            Self::Edit(command) => command.run(root)?,
            Self::Renumber(command) => command.run(root)?,
            Self::Retype(command) => command.run(root)?,
            Self::Move(command) => command.run(root)?,
            Self::Similar(command) => command.run(root)?,
            Self::Comment(command) => command.run(root)?,
            Self::Remove(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[instrument]
fn init(root: PathBuf) -> anyhow::Result<()> {
    let directory = Directory::new(root);
    let path = directory.init(&Config::default())?;

    println!("Initialized exam archive in {}", directory.root().display());
    println!("  Created: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  exam course add CT470 \"Artificial Intelligence\"");
    println!("  exam paper add CT470 2007 summer");
    Ok(())
}

/// Load the archive beneath `root`.
fn load(root: PathBuf) -> anyhow::Result<Directory<Loaded>> {
    let display = root.display().to_string();
    Directory::new(root)
        .load_all()
        .with_context(|| format!("failed to load archive from {display}"))
}

/// The identifier of the unique question at `address`.
fn resolve(archive: &Archive, address: &QuestionAddress) -> anyhow::Result<Uuid> {
    Ok(archive.resolve(address)?.id())
}

/// The identifier of the paper at `address`, narrowed to one sitting if
/// several exist.
fn resolve_paper(
    archive: &Archive,
    address: &PaperAddress,
    sitting: Option<u32>,
) -> anyhow::Result<Uuid> {
    archive
        .resolve_paper(address, sitting)
        .map(exam_archive::domain::Paper::id)
        .with_context(|| match sitting {
            None => "use --sitting to choose between sittings".to_string(),
            Some(sitting) => format!("no sitting {sitting} of {address}"),
        })
}

/// The identifier of the unique question at `path` within one paper.
fn question_in_paper(archive: &Archive, paper: Uuid, path: &QuestionPath) -> anyhow::Result<Uuid> {
    match archive.questions().find_by_path(paper, path) {
        [id] => Ok(*id),
        [] => anyhow::bail!("no question at {path}"),
        ids => anyhow::bail!(
            "{} questions share the path {path}; renumber with --cascade to disambiguate",
            ids.len()
        ),
    }
}

/// The display address of a question, e.g. `CT470/2007/summer/2.b`.
fn display_address(archive: &Archive, id: Uuid) -> String {
    let Some(question) = archive.questions().get(id) else {
        return id.to_string();
    };
    let paper = archive.catalog().paper(question.paper());
    let course = paper.and_then(|paper| archive.catalog().course(paper.course()));
    match (course, paper) {
        (Some(course), Some(paper)) => format!(
            "{}/{}/{}/{}",
            course.code(),
            paper.year_start(),
            paper.period(),
            question.materialized_path()
        ),
        _ => question.materialized_path().to_string(),
    }
}
