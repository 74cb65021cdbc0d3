use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;

use tankobon::error::Result;
use tankobon::types::DEFAULT_BATCH_SIZE;
use tankobon::{BatchPlan, MatchPolicy, ResolvedCover, TankobonConfig};

#[derive(Parser, Debug)]
#[command(name = "tankobon")]
#[command(about = "Batch numbered manga volumes into folders with numbered covers")]
#[command(version)]
pub struct Cli {
    /// Series folder holding the volume archives (~ is expanded)
    pub series_dir: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the plan and exit without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the plan as JSON and exit (implies --dry-run)
    #[arg(long)]
    pub json: bool,

    /// Resolve the series cover, print its path and exit
    #[arg(long)]
    pub print_cover_path: bool,

    /// Volumes per batch folder
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Never query remote cover providers
    #[arg(long)]
    pub no_remote: bool,

    /// Only accept remote results whose title matches the folder name exactly
    #[arg(long)]
    pub strict_match: bool,

    /// Font file used for the batch numbers
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the library configuration for an already resolved series directory.
    pub fn to_config(&self, series_dir: PathBuf) -> Result<TankobonConfig> {
        let mut builder = TankobonConfig::builder();
        builder
            .series_dir(series_dir)
            .batch_size(self.batch_size)
            .remote_lookup(!self.no_remote)
            .match_policy(if self.strict_match {
                MatchPolicy::Exact
            } else {
                MatchPolicy::Best
            });
        if let Some(font) = &self.font {
            builder.font_path(font.clone());
        }
        Ok(builder.build()?)
    }
}

/// Machine-readable form of the plan printed by `--json`.
#[derive(Debug, Serialize)]
pub struct PlanDocument<'a> {
    pub series_dir: &'a Path,
    pub batch_size: usize,
    pub cover: Option<&'a ResolvedCover>,
    pub batches: &'a [BatchPlan],
}

/// Asks for an explicit `y`/`yes`. Anything else, including EOF, declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt} [y/N]: ")?;
    stdout.flush()?;

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
