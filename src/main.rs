use anyhow::Result;
use clap::Parser;

use covlens::cli::{self, Cli};

fn main() -> Result<()> {
    cli::run(Cli::parse())
}
