mod cli;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, error, warn};

use cli::{Cli, PlanDocument, confirm};
use tankobon::error::{Error, Result};
use tankobon::path_utils::resolve_series_dir;
use tankobon::planner::format_plan;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module(
            "tankobon",
            if cli.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let series_dir = resolve_series_dir(&cli.series_dir)?;
    let config = cli.to_config(series_dir)?;
    config.preflight_check()?;

    let volumes = config.scan()?;

    if cli.print_cover_path {
        return Ok(match config.resolve_cover(&volumes) {
            Some(cover) => {
                println!("{}", cover.path.display());
                ExitCode::SUCCESS
            }
            None => ExitCode::FAILURE,
        });
    }

    if volumes.is_empty() {
        return Err(Error::NoVolumes(config.series_dir.clone()));
    }

    let cover = config.resolve_cover(&volumes);
    let plan = config.plan(&volumes, cover.as_ref())?;

    if cli.json {
        let document = PlanDocument {
            series_dir: &config.series_dir,
            batch_size: config.batch_size,
            cover: cover.as_ref(),
            batches: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(ExitCode::SUCCESS);
    }

    print!(
        "{}",
        format_plan(
            &config.series_dir,
            &plan,
            config.batch_size,
            cover.as_ref().map(|c| c.path.as_path()),
        )
    );

    if cli.dry_run {
        return Ok(ExitCode::SUCCESS);
    }
    if !cli.yes && !confirm("Proceed with these changes?")? {
        println!("Cancelled. No changes made.");
        return Ok(ExitCode::SUCCESS);
    }

    let report = config.execute(&plan, cover.as_ref())?;
    for (batch, message) in &report.cover_failures {
        warn!("[WARN] Batch {batch} has no numbered cover: {message}");
    }
    Ok(ExitCode::SUCCESS)
}
