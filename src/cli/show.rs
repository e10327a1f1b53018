use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use exam_archive::{
    Archive, Question, QuestionAddress,
    domain::{AddressError, PaperAddress},
};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, Parser)]
pub struct Show {
    /// The question, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let archive = directory.archive();
        let id = super::resolve(archive, &self.address)?;

        match self.output {
            OutputFormat::Pretty => output_pretty(archive, id),
            OutputFormat::Json => {
                let view = archive.view(id)?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        }
        Ok(())
    }
}

fn output_pretty(archive: &Archive, id: uuid::Uuid) {
    let Some(question) = archive.questions().get(id) else {
        return;
    };

    println!("# {}", super::display_address(archive, id));
    match question.content() {
        Some(content) => println!("{content}\n"),
        None => println!("{}\n", "(no content)".dim()),
    }

    println!("{}", "Metadata".dim());
    println!("  ID:        {}", question.id());
    println!(
        "  Index:     {} ({})",
        question.index(),
        question.index_type()
    );
    println!("  Path:      {}", question.path());
    if let Some(marks) = question.marks() {
        println!("  Marks:     {marks}");
    }
    if question.is_section() {
        println!("  Section:   yes");
    }
    println!("  Created:   {}", question.created());
    if has_stale_prefix(archive, question) {
        println!(
            "  {}",
            "Path prefix is stale; renumber with --cascade to refresh".warning()
        );
    }

    let children: Vec<_> = archive.questions().children(id).collect();
    if !children.is_empty() {
        println!("\n{}", "Children".dim());
        for child in children {
            println!(
                "  • {} {}",
                child.materialized_path().to_string().label(),
                terminal::preview(child.content().unwrap_or_default(), Some(60))
            );
        }
    }

    let similar: Vec<_> = archive.questions().similar(id).collect();
    if !similar.is_empty() {
        println!("\n{}", "Similar".dim());
        for (other, score) in similar {
            println!("  • {} ({score:.2})", super::display_address(archive, other));
        }
    }

    let comments = archive.comments().for_entity(id);
    if !comments.is_empty() {
        println!("\n{}", "Comments".dim());
        for comment in comments {
            println!(
                "  • {} {}: {}",
                comment.author(),
                comment.created().format("%Y-%m-%d").to_string().dim(),
                comment.content()
            );
        }
    }
}

/// Whether the question's path no longer extends its parent's path.
fn has_stale_prefix(archive: &Archive, question: &Question) -> bool {
    question
        .parent()
        .and_then(|parent| archive.questions().get(parent))
        .is_some_and(|parent| Some(parent.path()) != question.path().parent().as_ref())
}

#[derive(Debug, Clone)]
enum Target {
    Paper(PaperAddress),
    Question(QuestionAddress),
}

impl FromStr for Target {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Self::Question)
            .or_else(|_| s.parse().map(Self::Paper))
    }
}

#[derive(Debug, Parser)]
pub struct Tree {
    /// A paper (CT470/2007/summer) or question (CT470/2007/summer/2)
    target: Target,

    /// The sitting, when a paper was set more than once in a period
    #[arg(long)]
    sitting: Option<u32>,
}

impl Tree {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let archive = directory.archive();
        let questions = archive.questions();

        let (listing, base_depth) = match &self.target {
            Target::Paper(address) => {
                let paper = super::resolve_paper(archive, address, self.sitting)?;
                println!("{}", address.to_string().label());
                (questions.flatten_paper(paper), 0)
            }
            Target::Question(address) => {
                let id = super::resolve(archive, address)?;
                let listing = questions.flatten(id, true)?;
                let depth = listing.first().map_or(0, |q| q.path().len() - 1);
                (listing, depth)
            }
        };

        let width = terminal::terminal_width();
        for question in listing {
            let depth = question.path().len().saturating_sub(base_depth + 1);
            let indent = "  ".repeat(depth);
            let label = question.materialized_path().label().to_string();
            let marks = question
                .marks()
                .map(|marks| format!(" [{marks}]"))
                .unwrap_or_default();
            let used = indent.len() + label.len() + marks.len() + 1;
            let preview = terminal::preview(
                question.content().unwrap_or_default(),
                width.map(|w| w.saturating_sub(used)),
            );
            println!("{indent}{}{} {preview}", label.label(), marks.dim());
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct History {
    /// The question, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,
}

impl History {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let archive = directory.archive();
        let id = super::resolve(archive, &self.address)?;
        let Some(question) = archive.questions().get(id) else {
            anyhow::bail!("question {} not found", self.address);
        };

        if question.revisions().is_empty() {
            println!("{}", "No revisions".dim());
            return Ok(());
        }

        let current = question.revision().map(exam_archive::domain::Revision::id);
        for revision in question.revisions().iter().rev() {
            let marker = if Some(revision.id()) == current { "*" } else { " " };
            let fingerprint = revision.fingerprint();
            println!(
                "{marker} {} {} {}",
                fingerprint.get(..12).unwrap_or(&fingerprint).label(),
                revision.created().format("%Y-%m-%d %H:%M"),
                revision.author()
            );
            println!("    {}", terminal::preview(revision.content(), Some(72)));
        }
        Ok(())
    }
}
