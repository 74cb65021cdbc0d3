//! Cover images already sitting in the series directory.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::scanner::Scanner;
use crate::types::COVER_CANDIDATES;

/// Lists every usable-looking cover image in `series_dir`, best first.
///
/// The well-known names in [`COVER_CANDIDATES`] come first, in that order,
/// followed by the remaining loose images in natural order.
pub fn local_cover_candidates(series_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut candidates: Vec<PathBuf> = COVER_CANDIDATES
        .iter()
        .map(|name| series_dir.join(name))
        .filter(|path| path.is_file())
        .collect();

    for image in Scanner::new(series_dir).scan_images()? {
        if !candidates.contains(&image) {
            candidates.push(image);
        }
    }
    Ok(candidates)
}

/// Finds the best existing cover image in `series_dir`.
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - The first entry of [`local_cover_candidates`]
/// * `Ok(None)` - The directory holds no image at all
pub fn find_local_cover(series_dir: &Path) -> Result<Option<PathBuf>> {
    Ok(local_cover_candidates(series_dir)?.into_iter().next())
}
