//! `exam`: manage a plain-text archive of exam papers.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
