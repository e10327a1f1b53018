use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use exam_archive::{IndexType, QuestionAddress, QuestionPath};
use tracing::instrument;
use uuid::Uuid;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Renumber {
    /// The question, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// The new position among its siblings
    index: NonZeroUsize,

    /// Also regenerate the paths of every descendant
    #[arg(long)]
    cascade: bool,
}

impl Renumber {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let cascade = self.cascade || directory.config().cascade_renumber;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;
        let before = super::display_address(archive, id);

        let questions = archive.questions_mut();
        questions.update_index(id, self.index)?;
        let refreshed = if cascade {
            questions.refresh_paths(id)?
        } else {
            0
        };
        let after = super::display_address(archive, id);

        directory.flush()?;
        println!("{}", format!("Renumbered {before} → {after}").success());
        report_refresh(cascade, refreshed);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Retype {
    /// The question, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// The new numbering scheme (decimal, alpha, roman)
    index_type: IndexType,

    /// Retype every sibling so the group stays consistent
    #[arg(long)]
    group: bool,

    /// Also regenerate the paths of every descendant
    #[arg(long)]
    cascade: bool,
}

impl Retype {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let cascade = self.cascade || directory.config().cascade_renumber;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;

        let retyped: Vec<Uuid> = if self.group {
            let Some(question) = archive.questions().get(id) else {
                anyhow::bail!("question {} not found", self.address);
            };
            let siblings: Vec<Uuid> = match question.parent() {
                Some(parent) => archive.questions().children(parent).map(|q| q.id()).collect(),
                None => archive
                    .questions()
                    .roots(question.paper())
                    .map(|q| q.id())
                    .collect(),
            };
            archive
                .questions_mut()
                .retype_sibling_group(id, self.index_type)?;
            siblings
        } else {
            archive
                .questions_mut()
                .update_index_type(id, self.index_type)?;
            vec![id]
        };

        let mut refreshed = 0;
        if cascade {
            for question in &retyped {
                refreshed += archive.questions_mut().refresh_paths(*question)?;
            }
        }

        directory.flush()?;
        println!(
            "{}",
            format!(
                "Retyped {} question(s) to {}",
                retyped.len(),
                self.index_type
            )
            .success()
        );
        report_refresh(cascade, refreshed);
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct Move {
    /// The question to move, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// Its position beneath the new parent
    #[arg(long, short)]
    index: NonZeroUsize,

    /// Path of the new parent within the same paper; omit to move to the top
    /// level
    #[arg(long, short)]
    parent: Option<QuestionPath>,
}

impl Move {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;
        let Some(paper) = archive.questions().get(id).map(|q| q.paper()) else {
            anyhow::bail!("question {} not found", self.address);
        };
        let parent = self
            .parent
            .as_ref()
            .map(|path| super::question_in_paper(archive, paper, path))
            .transpose()?;

        archive.questions_mut().reparent(id, parent, self.index)?;
        let after = super::display_address(archive, id);

        directory.flush()?;
        println!(
            "{}",
            format!("Moved {} → {after}", self.address).success()
        );
        Ok(())
    }
}

fn report_refresh(cascade: bool, refreshed: usize) {
    if cascade {
        println!("{}", format!("Regenerated {refreshed} path(s)").dim());
    } else {
        println!(
            "{}",
            "Descendant paths were left unchanged; pass --cascade to regenerate them".dim()
        );
    }
}
