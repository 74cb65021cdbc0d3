//! Series cover resolution.
//!
//! A single base cover is resolved per series through a cascade, stopping at the
//! first stage that produces one:
//!
//! 1. the first page of the first volume (skipped when a readable `cover.jpg`
//!    already exists),
//! 2. an image already present in the series directory,
//! 3. the remote providers, in order.
//!
//! Whatever the source, the result is written to `{series_dir}/cover.jpg`.
//! Resolution is best effort: failures are logged and the caller simply gets
//! `None`.

pub mod local;
pub mod volume;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use log::{debug, info, warn};

use crate::error::Result;
use crate::path_utils::get_file_name_lossy;
use crate::provider::CoverProvider;
use crate::types::{COVER_FILE_NAME, CoverOrigin, ResolvedCover};

pub use local::{find_local_cover, local_cover_candidates};
pub use volume::{extract_volume_cover, first_image_entry, list_image_entries};

/// JPEG quality used for every cover the crate writes.
pub const JPEG_QUALITY: u8 = 95;

/// Encodes `image` as a JPEG at `path`.
///
/// The file is written next to its destination first and renamed into place,
/// so a failed encode never leaves a truncated `cover.jpg` behind.
pub fn save_jpeg(image: &DynamicImage, path: &Path) -> Result<()> {
    let partial = path.with_extension("jpg.part");
    let result = (|| -> Result<()> {
        let writer = BufWriter::new(File::create(&partial)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
        encoder.encode_image(&image.to_rgb8())?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            fs::rename(&partial, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

/// Decodes arbitrary image bytes and stores them as a JPEG at `path`.
pub fn write_cover_bytes(bytes: &[u8], path: &Path) -> Result<()> {
    let image = image::load_from_memory(bytes)?;
    save_jpeg(&image, path)
}

/// Makes sure `cover_path` holds the image at `source`, re-encoding it if needed.
///
/// `source` is always decoded, so an existing but corrupt `cover.jpg` is
/// reported as an error rather than reused.
pub fn ensure_cover_jpg(source: &Path, cover_path: &Path) -> Result<()> {
    let image = image::open(source)?;
    if source == cover_path {
        return Ok(());
    }
    save_jpeg(&image, cover_path)
}

/// Runs the cover cascade for one series directory.
pub struct CoverResolver {
    series_dir: PathBuf,
    title: String,
    providers: Vec<Box<dyn CoverProvider>>,
}

impl CoverResolver {
    /// Creates a resolver.
    ///
    /// # Arguments
    ///
    /// * `series_dir` - The series directory; `cover.jpg` is written here
    /// * `title` - Search term for remote providers, usually the directory name
    /// * `providers` - Remote providers in cascade order; empty disables stage 3
    pub fn new(
        series_dir: impl Into<PathBuf>,
        title: impl Into<String>,
        providers: Vec<Box<dyn CoverProvider>>,
    ) -> Self {
        Self {
            series_dir: series_dir.into(),
            title: title.into(),
            providers,
        }
    }

    /// Location of the canonical series cover.
    pub fn cover_path(&self) -> PathBuf {
        self.series_dir.join(COVER_FILE_NAME)
    }

    /// Resolves the series cover.
    ///
    /// # Arguments
    ///
    /// * `first_volume` - The first volume in natural order, if any
    ///
    /// # Returns
    ///
    /// * `Option<ResolvedCover>` - `None` when every stage came up empty
    pub fn resolve(&self, first_volume: Option<&Path>) -> Option<ResolvedCover> {
        let resolved = self
            .try_first_volume(first_volume)
            .or_else(|| self.try_local_file())
            .or_else(|| self.try_remote());

        match &resolved {
            Some(cover) => info!("[COVER] Series cover: {}", cover.describe()),
            None => warn!(
                "[WARN] No cover image found or downloaded for '{}'; batches get no cover",
                self.title
            ),
        }
        resolved
    }

    fn try_first_volume(&self, first_volume: Option<&Path>) -> Option<ResolvedCover> {
        let cover_path = self.cover_path();
        if cover_path.is_file() {
            if image::image_dimensions(&cover_path).is_ok() {
                debug!("{} already exists, skipping volume extraction", cover_path.display());
                return None;
            }
            warn!(
                "[WARN] {} cannot be decoded and will be replaced",
                cover_path.display()
            );
        }
        let volume = first_volume?;

        match extract_volume_cover(volume, &cover_path) {
            Ok(Some(result)) => Some(ResolvedCover {
                path: cover_path,
                origin: CoverOrigin::FirstVolume(result),
            }),
            Ok(None) => {
                debug!("No image entries in {}", get_file_name_lossy(volume));
                None
            }
            Err(e) => {
                debug!(
                    "Cover extraction from {} failed: {}",
                    get_file_name_lossy(volume),
                    e
                );
                None
            }
        }
    }

    fn try_local_file(&self) -> Option<ResolvedCover> {
        let candidates = match local_cover_candidates(&self.series_dir) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("[WARN] Could not look for a local cover: {}", e);
                return None;
            }
        };

        let cover_path = self.cover_path();
        for source in candidates {
            match ensure_cover_jpg(&source, &cover_path) {
                Ok(()) => {
                    return Some(ResolvedCover {
                        path: cover_path,
                        origin: CoverOrigin::LocalFile(source),
                    });
                }
                Err(e) => warn!(
                    "[WARN] Local cover {} is unusable: {}",
                    get_file_name_lossy(&source),
                    e
                ),
            }
        }
        None
    }

    fn try_remote(&self) -> Option<ResolvedCover> {
        let cover_path = self.cover_path();

        for provider in &self.providers {
            let name = provider.name();
            let found = match provider.attempt(&self.title) {
                Ok(Some(found)) => found,
                Ok(None) => {
                    debug!("{name}: no match for '{}'", self.title);
                    continue;
                }
                Err(e) => {
                    warn!("[WARN] {name} lookup failed: {e}");
                    continue;
                }
            };

            match provider
                .download(&found)
                .and_then(|bytes| write_cover_bytes(&bytes, &cover_path))
            {
                Ok(()) => {
                    return Some(ResolvedCover {
                        path: cover_path,
                        origin: CoverOrigin::Remote(found),
                    });
                }
                Err(e) => warn!("[WARN] {name} cover download failed: {e}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDir;

    fn save_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::from_pixel(width, height, image::Rgb([1, 2, 3]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_local_png_is_reencoded() {
        let dir = TestDir::new("cover_reencode");
        save_png(&dir.join("poster.png"), 8, 12);

        let resolver = CoverResolver::new(&*dir, "Series", Vec::new());
        let cover = resolver.resolve(None).unwrap();
        assert_eq!(cover.path, dir.join("cover.jpg"));
        assert_eq!(cover.origin, CoverOrigin::LocalFile(dir.join("poster.png")));
        assert_eq!(image::open(&cover.path).unwrap().height(), 12);
        assert!(!dir.join("cover.jpg.part").exists());
    }

    #[test]
    fn test_existing_cover_is_reused_as_is() {
        let dir = TestDir::new("cover_cached");
        save_png(&dir.join("cover.jpg"), 8, 12);
        let before = fs::read(dir.join("cover.jpg")).unwrap();

        let cover = CoverResolver::new(&*dir, "Series", Vec::new())
            .resolve(None)
            .unwrap();
        assert_eq!(cover.origin, CoverOrigin::LocalFile(dir.join("cover.jpg")));
        assert_eq!(fs::read(dir.join("cover.jpg")).unwrap(), before);
    }

    #[test]
    fn test_corrupt_candidate_falls_through_to_next() {
        let dir = TestDir::new("cover_corrupt_local");
        fs::write(dir.join("cover.png"), b"not an image").unwrap();
        save_png(&dir.join("poster.png"), 10, 14);

        let cover = CoverResolver::new(&*dir, "Series", Vec::new())
            .resolve(None)
            .unwrap();
        assert_eq!(cover.origin, CoverOrigin::LocalFile(dir.join("poster.png")));
        assert_eq!(image::open(&cover.path).unwrap().height(), 14);
    }

    #[test]
    fn test_ensure_cover_jpg_rejects_corrupt_cover_in_place() {
        let dir = TestDir::new("cover_corrupt_cached");
        let cover_path = dir.join("cover.jpg");
        fs::write(&cover_path, b"garbage").unwrap();
        assert!(ensure_cover_jpg(&cover_path, &cover_path).is_err());
    }

    #[test]
    fn test_nothing_found() {
        let dir = TestDir::new("cover_nothing");
        assert!(CoverResolver::new(&*dir, "Series", Vec::new()).resolve(None).is_none());
    }
}
