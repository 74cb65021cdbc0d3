//! Series directory scanning.
//!
//! This module lists the volume archives and loose images of a series directory.
//! Hidden files and macOS AppleDouble companions (`._name`) are skipped, and
//! every listing is returned in natural order.

use std::fs::read_dir;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::natural::sort_paths_natural;
use crate::path_utils::{get_file_name_lossy, has_extension, is_hidden_file};
use crate::types::{IMAGE_EXTENSIONS, VOLUME_EXTENSIONS, VolumeFile};

/// Lists the contents of a single series directory.
#[derive(Debug)]
pub struct Scanner<'a> {
    series_dir: &'a Path,
}

impl<'a> Scanner<'a> {
    /// Creates a new Scanner for the given series directory.
    pub fn new(series_dir: &'a Path) -> Self {
        Self { series_dir }
    }

    /// Collects the volume archives, sorted naturally.
    ///
    /// An empty result is not an error here; the planner decides what "no
    /// volumes" means.
    pub fn scan_volumes(&self) -> Result<Vec<VolumeFile>> {
        let mut volumes: Vec<VolumeFile> = self
            .collect_files(VOLUME_EXTENSIONS)?
            .into_iter()
            .map(VolumeFile::new)
            .collect();
        volumes.sort();
        debug!(
            "Scanned {} volume(s) in {}",
            volumes.len(),
            self.series_dir.display()
        );
        Ok(volumes)
    }

    /// Collects loose image files, sorted naturally.
    pub fn scan_images(&self) -> Result<Vec<PathBuf>> {
        let mut images = self.collect_files(IMAGE_EXTENSIONS)?;
        sort_paths_natural(&mut images);
        Ok(images)
    }

    /// Collects regular, non-hidden files carrying one of `extensions`.
    ///
    /// # Arguments
    ///
    /// * `extensions` - Accepted extensions, with leading dot, matched case-insensitively
    ///
    /// # Returns
    ///
    /// * `Result<Vec<PathBuf>>` - Matching paths in directory order
    pub fn collect_files(&self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let entries = read_dir(self.series_dir).map_err(|e| {
            Error::InvalidPath(
                self.series_dir.to_path_buf(),
                format!("Cannot read directory: {}", e),
            )
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();

            if is_hidden_file(&path) || !path.is_file() {
                continue;
            }
            if has_extension(&get_file_name_lossy(&path), extensions) {
                files.push(path);
            }
        }
        Ok(files)
    }
}
