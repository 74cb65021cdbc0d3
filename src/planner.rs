//! Batch planning.
//!
//! Splits the ordered volumes into fixed-size batches and works out, for every
//! volume, the destination folder and a collision-free clean file name. Planning
//! reads the filesystem (to avoid existing names) but never changes it, so the
//! printed plan is exactly what the executor will do.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::normalize::clean_volume_filename_padded;
use crate::path_utils::{get_file_name_lossy, split_extension};
use crate::types::{BatchPlan, FileMove, VolumeFile};

const RULE_WIDTH: usize = 98;

/// File names already claimed inside one batch directory.
///
/// A fresh set is created for every batch and handed to [`plan_batch`] by value,
/// which keeps planning a pure function of its inputs.
#[derive(Debug, Default, Clone)]
pub struct NameReservations {
    names: HashSet<String>,
}

impl NameReservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Claims the first free variant of `file_name` in `dest_dir` and returns it.
    ///
    /// A name is free when it is neither reserved nor present on disk. Variants are
    /// `"stem (2).ext"`, `"stem (3).ext"` and so on.
    pub fn reserve(&mut self, dest_dir: &Path, file_name: &str) -> String {
        let is_free =
            |names: &HashSet<String>, name: &str| !names.contains(name) && !dest_dir.join(name).exists();

        if is_free(&self.names, file_name) {
            self.names.insert(file_name.to_string());
            return file_name.to_string();
        }

        let (stem, ext) = split_extension(file_name);
        let mut idx = 2;
        loop {
            let candidate = format!("{stem} ({idx}){ext}");
            if is_free(&self.names, &candidate) {
                self.names.insert(candidate.clone());
                return candidate;
            }
            idx += 1;
        }
    }
}

/// Settings the planner needs besides the volumes themselves.
#[derive(Debug, Clone)]
pub struct PlanSettings<'a> {
    /// Directory the batch folders are created in.
    pub parent_dir: &'a Path,
    /// Display name used for `"{series_name} {i}"` folders.
    pub series_name: &'a str,
    pub batch_size: usize,
    pub pad_width: usize,
    /// Whether a series cover was resolved, i.e. whether batches get numbered covers.
    pub with_cover: bool,
}

/// Plans every batch for `volumes`, which must already be in natural order.
///
/// # Arguments
///
/// * `volumes` - The scanned volumes
/// * `series_dir` - The directory they were scanned from, reported when empty
/// * `settings` - Destination and naming settings
///
/// # Returns
///
/// * `Ok(Vec<BatchPlan>)` - One plan per batch, in order
/// * `Err(Error::NoVolumes)` - `volumes` is empty
pub fn plan_batches(
    volumes: &[VolumeFile],
    series_dir: &Path,
    settings: &PlanSettings<'_>,
) -> Result<Vec<BatchPlan>> {
    if volumes.is_empty() {
        return Err(Error::NoVolumes(series_dir.to_path_buf()));
    }
    if settings.batch_size == 0 {
        return Err(Error::Other("Batch size must be at least 1".to_string()));
    }

    Ok(volumes
        .chunks(settings.batch_size)
        .enumerate()
        .map(|(i, chunk)| {
            let batch_index = i + 1;
            plan_batch(
                batch_index,
                i * settings.batch_size + 1,
                chunk,
                settings,
                NameReservations::new(),
            )
        })
        .collect())
}

/// Plans a single batch using the given reservation set.
pub fn plan_batch(
    batch_index: usize,
    first_ordinal: usize,
    chunk: &[VolumeFile],
    settings: &PlanSettings<'_>,
    mut reservations: NameReservations,
) -> BatchPlan {
    let batch_dir = batch_dir_for(settings.parent_dir, settings.series_name, batch_index);

    let moves = chunk
        .iter()
        .map(|volume| {
            let cleaned = clean_volume_filename_padded(&volume.file_name(), settings.pad_width);
            let dst_name = reservations.reserve(&batch_dir, &cleaned);
            FileMove {
                src: volume.path().to_path_buf(),
                dst: batch_dir.join(&dst_name),
                dst_name,
            }
        })
        .collect();

    BatchPlan {
        batch_index,
        batch_dir,
        first_ordinal,
        moves,
        will_make_cover: settings.with_cover,
    }
}

/// Folder of batch `index`: `"{parent}/{series_name} {index}"`.
pub fn batch_dir_for(parent_dir: &Path, series_name: &str, index: usize) -> PathBuf {
    parent_dir.join(format!("{series_name} {index}"))
}

/// Renders the plan as the text shown before asking for confirmation.
pub fn format_plan(
    series_dir: &Path,
    plan: &[BatchPlan],
    batch_size: usize,
    cover: Option<&Path>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let volume_count: usize = plan.iter().map(|b| b.moves.len()).sum();
    let series_name = get_file_name_lossy(series_dir);

    // Writing into a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "[PLAN] Series folder: {}", series_dir.display());
    let _ = writeln!(out, "[PLAN] Volumes found: {volume_count}");
    let _ = writeln!(out, "[PLAN] Batch size: {batch_size}");
    match cover {
        Some(cover) => {
            let _ = writeln!(out, "[PLAN] Series cover source: {}", cover.display());
            let _ = writeln!(out, "[PLAN] Each batch will have:");
            let _ = writeln!(out, "       - cover.jpg (rendered with the batch number, centered)");
            let _ = writeln!(out, "       - any existing cover.jpg archived to cover_old*.jpg");
        }
        None => {
            let _ = writeln!(out, "[PLAN] Covers: skipped (no cover image found/downloaded)");
        }
    }
    let _ = writeln!(out, "{rule}");

    for batch in plan {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} {}  (volumes {}-{})",
            series_name,
            batch.batch_index,
            batch.first_ordinal,
            batch.last_ordinal()
        );
        let _ = writeln!(out, "  [DIR] {}", batch.batch_dir.display());
        if batch.will_make_cover {
            let _ = writeln!(out, "  [COVER] cover.jpg (number {})", batch.batch_index);
        }

        for (i, mv) in batch.moves.iter().enumerate() {
            let n = batch.first_ordinal + i;
            let src_name = get_file_name_lossy(&mv.src);
            if mv.is_rename() {
                let _ = writeln!(
                    out,
                    "  {n:>4}. {src_name}  (rename: {src_name} -> {})",
                    mv.dst_name
                );
            } else {
                let _ = writeln!(out, "  {n:>4}. {src_name}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    out
}
