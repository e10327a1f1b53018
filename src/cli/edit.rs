use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use exam_archive::{IndexType, QuestionAddress, QuestionPath, domain::PaperAddress};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Add {
    /// The paper, e.g. CT470/2007/summer
    paper: PaperAddress,

    /// The sitting, when a paper was set more than once in a period
    #[arg(long)]
    sitting: Option<u32>,

    /// Position among its siblings, starting at 1
    #[arg(long, short)]
    index: NonZeroUsize,

    /// Path of the parent question, e.g. 2.1
    #[arg(long, short)]
    parent: Option<QuestionPath>,

    /// Numbering scheme for a new sibling group (decimal, alpha, roman)
    ///
    /// Ignored if the question joins a group that already has members.
    #[arg(long = "type", short = 't')]
    index_type: Option<IndexType>,

    /// Marks available for the question
    #[arg(long)]
    marks: Option<u32>,

    /// Mark the question as a structural section header
    #[arg(long)]
    section: bool,

    /// Author of the initial content
    #[arg(long, requires = "content")]
    author: Option<String>,

    /// Initial content of the question
    #[arg(long, requires = "author")]
    content: Option<String>,
}

impl Add {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let index_type = self
            .index_type
            .unwrap_or(directory.config().default_index_type);

        let archive = directory.archive_mut();
        let paper = super::resolve_paper(archive, &self.paper, self.sitting)?;
        let parent = self
            .parent
            .as_ref()
            .map(|path| super::question_in_paper(archive, paper, path))
            .transpose()?;

        let id = archive.new_question(paper, self.index, Some(index_type), parent)?;
        if let Some(question) = archive.questions_mut().get_mut(id) {
            question.set_marks(self.marks);
            question.set_section(self.section);
            if let (Some(author), Some(content)) = (self.author, self.content) {
                question.set_content(author, content);
            }
        }
        let address = super::display_address(archive, id);

        directory.flush()?;
        println!("{}", format!("Added question {address}").success());
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Edit {
    /// The question, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// Author of the new revision
    #[arg(long)]
    author: String,

    /// The new content
    #[arg(long)]
    content: String,

    /// Update the marks available
    #[arg(long)]
    marks: Option<u32>,
}

impl Edit {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;

        let Some(question) = archive.questions_mut().get_mut(id) else {
            anyhow::bail!("question {} not found", self.address);
        };
        if self.marks.is_some() {
            question.set_marks(self.marks);
        }
        let fingerprint = question.set_content(self.author, self.content).fingerprint();

        directory.flush()?;
        println!(
            "{} {}",
            format!("Updated {}", self.address).success(),
            fingerprint.get(..12).unwrap_or(&fingerprint).dim()
        );
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Similar {
    /// The question
    address: QuestionAddress,

    /// The question it resembles
    other: QuestionAddress,

    /// Similarity score
    #[arg(required_unless_present = "remove")]
    score: Option<f64>,

    /// Remove the link instead of recording it
    #[arg(long, conflicts_with = "score")]
    remove: bool,
}

impl Similar {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let archive = directory.archive_mut();
        let from = super::resolve(archive, &self.address)?;
        let to = super::resolve(archive, &self.other)?;

        let Some(score) = self.score else {
            if archive.questions_mut().remove_similar(from, to).is_none() {
                anyhow::bail!("{} is not marked as similar to {}", self.address, self.other);
            }
            directory.flush()?;
            println!(
                "{}",
                format!("Unlinked {} from {}", self.address, self.other).success()
            );
            return Ok(());
        };

        let previous = archive.questions_mut().add_similar(from, to, score)?;

        directory.flush()?;
        match previous {
            Some(previous) => println!(
                "{}",
                format!(
                    "Updated similarity of {} to {} ({previous:.2} → {score:.2})",
                    self.address, self.other
                )
                .success()
            ),
            None => println!(
                "{}",
                format!("Marked {} as similar to {}", self.address, self.other).success()
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Comment {
    /// The question to comment on
    address: QuestionAddress,

    /// Who is commenting
    #[arg(long)]
    author: String,

    /// The comment
    #[arg(long)]
    text: String,
}

impl Comment {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;

        archive.add_comment(id, self.author, self.text)?;

        directory.flush()?;
        println!("{}", format!("Commented on {}", self.address).success());
        Ok(())
    }
}
