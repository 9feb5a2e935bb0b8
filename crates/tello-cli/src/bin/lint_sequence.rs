//! Lint a JSON drone command sequence before flying it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tello_cli::{load_sequence, LintReport};

/// Check a command sequence for unsafe commands and ordering problems
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Sequence file: a list of commands or {"commands": [...]}
    sequence: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.sequence)
        .with_context(|| format!("reading {}", args.sequence.display()))?;
    let commands = load_sequence(&raw)
        .with_context(|| format!("parsing {}", args.sequence.display()))?;

    let report = LintReport::new(commands);
    print!("{}", report.render());

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
