//! Plan execution.
//!
//! Applies a [`BatchPlan`] list strictly in order: create the batch folder, move
//! its volumes, then stamp its numbered cover. A failed move stops the run
//! immediately; moves already made stay in place. A failed cover only costs
//! that batch its cover.

use std::fs;
use std::path::Path;

use image::DynamicImage;
use log::{info, warn};

use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;
use crate::synth::CoverSynthesizer;
use crate::types::{BatchPlan, ExecutionReport, FileMove};

/// The series cover together with the synthesizer that numbers it.
pub struct CoverJob<'a> {
    pub base_path: &'a Path,
    pub synthesizer: &'a CoverSynthesizer,
}

/// Moves one file with a plain rename.
///
/// Moves stay on the same volume, so there is no copy fallback.
pub fn apply_move(mv: &FileMove) -> Result<()> {
    fs::rename(&mv.src, &mv.dst).map_err(|source| Error::Move {
        from: mv.src.clone(),
        to: mv.dst.clone(),
        source,
    })
}

/// Executes the whole plan.
///
/// # Arguments
///
/// * `plan` - Batches in order, as produced by the planner
/// * `cover` - The resolved series cover, or `None` to skip numbered covers
///
/// # Returns
///
/// * `Ok(ExecutionReport)` - Every move succeeded; cover failures are listed in the report
/// * `Err(Error::InvalidPath)` - A batch folder could not be created
/// * `Err(Error::Move)` - A move failed; later batches were not touched
pub fn execute(plan: &[BatchPlan], cover: Option<CoverJob<'_>>) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();
    let total: usize = plan.iter().map(|b| b.moves.len()).sum();

    let base = cover.as_ref().map(|job| {
        job.synthesizer
            .load_base(job.base_path)
            .map_err(|e| e.to_string())
    });

    info!("");
    info!("[DO] Starting reorganization...");

    let mut done = 0;
    for batch in plan {
        info!("");
        info!(
            "[DO] Batch {}: {}",
            batch.batch_index,
            get_file_name_lossy(&batch.batch_dir)
        );
        fs::create_dir_all(&batch.batch_dir).map_err(|e| {
            Error::InvalidPath(
                batch.batch_dir.clone(),
                format!("Cannot create batch directory: {}", e),
            )
        })?;

        for mv in &batch.moves {
            done += 1;
            info!(
                "[MOVE] ({}/{}) {} -> {}",
                done,
                total,
                get_file_name_lossy(&mv.src),
                mv.dst_name
            );
            apply_move(mv)?;
            report.files_moved += 1;
        }

        if batch.will_make_cover {
            if let (Some(job), Some(base)) = (&cover, &base) {
                match write_batch_cover(job.synthesizer, base, batch) {
                    Ok(()) => report.covers_written += 1,
                    Err(message) => {
                        warn!(
                            "[WARN] Cover for batch {} failed: {}",
                            batch.batch_index, message
                        );
                        report.cover_failures.push((batch.batch_index, message));
                    }
                }
            }
        }

        report.batches_completed += 1;
    }

    info!("");
    info!(
        "[COMPLETE] Moved {} file(s) into {} batch folder(s), wrote {} cover(s)",
        report.files_moved, report.batches_completed, report.covers_written
    );
    Ok(report)
}

fn write_batch_cover(
    synthesizer: &CoverSynthesizer,
    base: &std::result::Result<DynamicImage, String>,
    batch: &BatchPlan,
) -> std::result::Result<(), String> {
    let base = base.as_ref().map_err(|e| format!("series cover unreadable: {e}"))?;
    let written = synthesizer
        .write_numbered_cover(base, &batch.batch_dir, batch.batch_index)
        .map_err(|e| e.to_string())?;
    info!(
        "[COVER] {} (number {})",
        written.display(),
        batch.batch_index
    );
    Ok(())
}
