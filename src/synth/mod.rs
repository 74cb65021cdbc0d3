//! Numbered batch covers.
//!
//! The batch number is drawn onto a copy of the series cover at the largest
//! size that fits inside the margins (scaled down by the fill ratio), with its
//! ink box centered exactly on the image. The series cover itself is only read.

pub mod face;

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba};
use log::{debug, info};

use crate::cover::save_jpeg;
use crate::error::{Error, Result};
use crate::types::COVER_FILE_NAME;

pub use face::{InkBox, LabelFace, SegmentFace, TrueTypeFace, load_face};

/// Smallest font size ever used.
pub const MIN_FONT_SIZE: u32 = 10;
/// Default empty border on each side, as a fraction of the image dimension.
pub const DEFAULT_MARGIN: f32 = 0.06;
/// Default fraction of the largest fitting size that is actually used.
pub const DEFAULT_FILL_RATIO: f32 = 0.90;
/// Upper bound on linear back-off steps after the binary search.
const MAX_BACKOFF_STEPS: u32 = 64;

/// Layout parameters for numbered covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthSettings {
    pub margin: f32,
    pub fill_ratio: f32,
    pub color: Rgba<u8>,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            fill_ratio: DEFAULT_FILL_RATIO,
            color: Rgba([0, 0, 0, 255]),
        }
    }
}

/// Finds the largest font size whose ink box fits inside the margins.
///
/// Binary search over `[MIN_FONT_SIZE, 5 * max(width, height)]`, followed by a
/// bounded linear back-off in case the face does not measure monotonically.
///
/// # Arguments
///
/// * `face` - The face that will draw the label
/// * `label` - Text to fit
/// * `width`, `height` - Image dimensions in pixels
/// * `margin` - Border on each side as a fraction of the dimension
///
/// # Returns
///
/// * `u32` - The fitting size, never below [`MIN_FONT_SIZE`]
pub fn fit_font_size(face: &dyn LabelFace, label: &str, width: u32, height: u32, margin: f32) -> u32 {
    let avail_w = width as f32 * (1.0 - 2.0 * margin);
    let avail_h = height as f32 * (1.0 - 2.0 * margin);
    let fits = |size: u32| match face.measure(label, size) {
        Some(ink) => ink.width() as f32 <= avail_w && ink.height() as f32 <= avail_h,
        None => true,
    };

    let mut lo = MIN_FONT_SIZE;
    let mut hi = (5 * width.max(height)).max(MIN_FONT_SIZE);
    let mut best = MIN_FONT_SIZE;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            best = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    let mut size = best;
    let mut steps = 0;
    while size > MIN_FONT_SIZE && steps < MAX_BACKOFF_STEPS && !fits(size) {
        size -= 1;
        steps += 1;
    }
    size.max(MIN_FONT_SIZE)
}

/// Scales a fitted size by the fill ratio, keeping it at or above [`MIN_FONT_SIZE`].
pub fn apply_fill_ratio(size: u32, fill_ratio: f32) -> u32 {
    ((size as f32 * fill_ratio).floor() as u32).max(MIN_FONT_SIZE)
}

/// Draw origin that puts the center of `ink` on the center of a `width x height` image.
pub fn centered_origin(ink: &InkBox, width: u32, height: u32) -> (i32, i32) {
    let x = (width as f32 - ink.width() as f32) / 2.0 - ink.min_x as f32;
    let y = (height as f32 - ink.height() as f32) / 2.0 - ink.min_y as f32;
    (x.round() as i32, y.round() as i32)
}

/// Renders `label` centered on a copy of `base`.
pub fn render_centered_label(
    base: &DynamicImage,
    label: &str,
    face: &dyn LabelFace,
    settings: &SynthSettings,
) -> DynamicImage {
    let mut canvas = base.to_rgba8();
    let (width, height) = canvas.dimensions();

    let fitted = fit_font_size(face, label, width, height, settings.margin);
    let size = apply_fill_ratio(fitted, settings.fill_ratio);
    debug!("Label '{label}': fitted size {fitted}, drawing at {size}");

    if let Some(ink) = face.measure(label, size) {
        let origin = centered_origin(&ink, width, height);
        face.draw(&mut canvas, label, size, origin, settings.color);
    }
    DynamicImage::ImageRgba8(canvas)
}

/// First free `cover_old.jpg`, `cover_old_2.jpg`, `cover_old_3.jpg`, ... in `dir`.
pub fn unique_cover_old_path(dir: &Path) -> PathBuf {
    let first = dir.join("cover_old.jpg");
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("cover_old_{n}.jpg")))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

/// Renames an existing `cover.jpg` in `dir` out of the way.
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - Where the old cover now lives
/// * `Ok(None)` - There was nothing to archive
pub fn archive_existing_cover(dir: &Path) -> Result<Option<PathBuf>> {
    let current = dir.join(COVER_FILE_NAME);
    if !current.is_file() {
        return Ok(None);
    }
    let archived = unique_cover_old_path(dir);
    fs::rename(&current, &archived)?;
    info!(
        "[COVER] Archived existing cover -> {}",
        archived.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(Some(archived))
}

/// Draws batch numbers onto the series cover.
pub struct CoverSynthesizer {
    face: Box<dyn LabelFace>,
    settings: SynthSettings,
}

impl CoverSynthesizer {
    pub fn new(face: Box<dyn LabelFace>, settings: SynthSettings) -> Self {
        Self { face, settings }
    }

    pub fn face(&self) -> &dyn LabelFace {
        self.face.as_ref()
    }

    /// Decodes the series cover once for all batches.
    pub fn load_base(&self, cover_path: &Path) -> Result<DynamicImage> {
        let image = image::open(cover_path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Unsupported(format!(
                "Empty cover image: {}",
                cover_path.display()
            )));
        }
        Ok(image)
    }

    /// Writes `{batch_dir}/cover.jpg` showing `number`, archiving any previous one.
    pub fn write_numbered_cover(
        &self,
        base: &DynamicImage,
        batch_dir: &Path,
        number: usize,
    ) -> Result<PathBuf> {
        let rendered = render_centered_label(
            base,
            &number.to_string(),
            self.face.as_ref(),
            &self.settings,
        );
        archive_existing_cover(batch_dir)?;
        let output = batch_dir.join(COVER_FILE_NAME);
        save_jpeg(&rendered, &output)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDir;

    /// A face whose ink is `size` wide per character and `size` tall.
    struct SquareFace;

    impl LabelFace for SquareFace {
        fn measure(&self, text: &str, size: u32) -> Option<InkBox> {
            let n = text.chars().count() as i32;
            (n > 0).then(|| InkBox {
                min_x: 0,
                min_y: 0,
                max_x: n * size as i32,
                max_y: size as i32,
            })
        }

        fn draw(&self, _: &mut image::RgbaImage, _: &str, _: u32, _: (i32, i32), _: Rgba<u8>) {}

        fn describe(&self) -> String {
            "square".to_string()
        }
    }

    /// Measures wider at one specific size, breaking monotonicity.
    struct BumpyFace;

    impl LabelFace for BumpyFace {
        fn measure(&self, text: &str, size: u32) -> Option<InkBox> {
            let mut ink = SquareFace.measure(text, size)?;
            if size == 80 {
                ink.max_x += 1000;
            }
            Some(ink)
        }

        fn draw(&self, _: &mut image::RgbaImage, _: &str, _: u32, _: (i32, i32), _: Rgba<u8>) {}

        fn describe(&self) -> String {
            "bumpy".to_string()
        }
    }

    #[test]
    fn test_fit_is_largest_fitting_size() {
        // 200x100 with no margin: "12" fits while 2*size <= 200 and size <= 100.
        assert_eq!(fit_font_size(&SquareFace, "12", 200, 100, 0.0), 100);
        assert_eq!(fit_font_size(&SquareFace, "123", 200, 100, 0.0), 66);
        // 10% margins leave 160x80.
        assert_eq!(fit_font_size(&SquareFace, "12", 200, 100, 0.1), 80);
    }

    #[test]
    fn test_longer_labels_never_get_larger() {
        let mut previous = u32::MAX;
        for label in ["1", "12", "123", "1234", "12345"] {
            let size = fit_font_size(&SquareFace, label, 600, 900, DEFAULT_MARGIN);
            assert!(size <= previous, "{label} got {size} > {previous}");
            previous = size;
        }
    }

    #[test]
    fn test_fit_clamps_to_minimum() {
        assert_eq!(fit_font_size(&SquareFace, "123456789", 20, 20, 0.0), MIN_FONT_SIZE);
    }

    #[test]
    fn test_backoff_result_fits() {
        let size = fit_font_size(&BumpyFace, "12", 200, 100, 0.1);
        let ink = BumpyFace.measure("12", size).unwrap();
        assert!(ink.width() as f32 <= 160.0 && ink.height() as f32 <= 80.0);
    }

    #[test]
    fn test_fill_ratio() {
        assert_eq!(apply_fill_ratio(100, 0.9), 90);
        assert_eq!(apply_fill_ratio(11, 0.5), MIN_FONT_SIZE);
    }

    #[test]
    fn test_centered_origin() {
        let ink = InkBox {
            min_x: 3,
            min_y: -2,
            max_x: 23,
            max_y: 38,
        };
        let (x, y) = centered_origin(&ink, 100, 60);
        assert_eq!(x + ink.min_x + ink.width() as i32 / 2, 50);
        assert_eq!(y + ink.min_y + ink.height() as i32 / 2, 30);
    }

    #[test]
    fn test_unique_cover_old_path() {
        let dir = TestDir::new("synth_old");

        assert_eq!(unique_cover_old_path(&dir), dir.join("cover_old.jpg"));
        fs::write(dir.join("cover_old.jpg"), b"1").unwrap();
        assert_eq!(unique_cover_old_path(&dir), dir.join("cover_old_2.jpg"));
        fs::write(dir.join("cover_old_2.jpg"), b"2").unwrap();
        assert_eq!(unique_cover_old_path(&dir), dir.join("cover_old_3.jpg"));

        assert_eq!(archive_existing_cover(&dir).unwrap(), None);
    }
}
