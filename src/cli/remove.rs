use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dialoguer::Confirm;
use exam_archive::QuestionAddress;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Remove {
    /// The question to remove, e.g. CT470/2007/summer/2.1
    address: QuestionAddress,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Remove {
    #[instrument(skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut directory = super::load(root)?;
        let archive = directory.archive_mut();
        let id = super::resolve(archive, &self.address)?;

        let subtree = archive.questions().flatten(id, true)?;
        let comments: usize = subtree
            .iter()
            .map(|question| archive.comments().for_entity(question.id()).len())
            .sum();

        if !self.yes {
            println!("Will remove:");
            for question in &subtree {
                println!("  • {}", question.materialized_path());
            }
            if comments > 0 {
                println!("  • {comments} comment(s)");
            }

            let proceed = Confirm::new()
                .with_prompt("Proceed?")
                .default(false)
                .interact()
                .context("failed to read confirmation")?;
            if !proceed {
                println!("Cancelled");
                std::process::exit(130);
            }
        }

        let removed = archive.remove_question(id)?;

        directory.flush()?;
        println!(
            "{}",
            format!(
                "Removed {} question(s) at {}",
                removed.len(),
                self.address
            )
            .success()
        );
        Ok(())
    }
}
