//! Common test utilities for the Tankobon crate.
//!
//! Provides unique test directories laid out like a real library, and writers
//! for dummy images and dummy volume archives.

use image::{Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tankobon::error::Result;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const SERIES_NAME: &str = "My Series";

/// A `library/My Series` layout under a unique directory in `tests/tmp`.
#[allow(dead_code)]
pub struct TestDirs {
    pub base: PathBuf,
    /// Parent of the series; batch folders appear here.
    pub library: PathBuf,
    pub series: PathBuf,
}

#[allow(dead_code)]
impl TestDirs {
    /// Path of batch folder `index`.
    pub fn batch(&self, index: usize) -> PathBuf {
        self.library.join(format!("{SERIES_NAME} {index}"))
    }
}

impl Drop for TestDirs {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.base);
    }
}

/// Creates a fresh, empty test layout. Removed again when dropped.
#[allow(dead_code)]
pub fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let base = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if base.exists() {
        fs::remove_dir_all(&base).unwrap();
    }
    let library = base.join("library");
    let series = library.join(SERIES_NAME);
    fs::create_dir_all(&series).unwrap();

    TestDirs {
        base,
        library,
        series,
    }
}

/// Encodes a solid-color image of the given size as PNG bytes.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, color);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Writes a solid-color image; the format follows the extension.
#[allow(dead_code)]
pub fn create_dummy_image(path: &Path, width: u32, height: u32, color: Rgb<u8>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    RgbImage::from_pixel(width, height, color).save(path)?;
    Ok(())
}

/// Writes a `.cbz` holding `ComicInfo.xml` and, optionally, one page image.
#[allow(dead_code)]
pub fn create_dummy_cbz(path: &Path, page: Option<Rgb<u8>>) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    zip.start_file("ComicInfo.xml", SimpleFileOptions::default())?;
    zip.write_all(b"<ComicInfo/>")?;
    if let Some(color) = page {
        zip.start_file("pages/001.png", SimpleFileOptions::default())?;
        zip.write_all(&png_bytes(60, 90, color))?;
    }
    zip.finish()?;
    Ok(())
}

/// Fills the series folder with `count` volumes named `"{SERIES_NAME} v{i} (Digital).cbz"`.
#[allow(dead_code)]
pub fn create_volumes(dirs: &TestDirs, count: usize, first_page: Option<Rgb<u8>>) -> Result<()> {
    for i in 1..=count {
        let path = dirs.series.join(format!("{SERIES_NAME} v{i} (Digital).cbz"));
        create_dummy_cbz(&path, if i == 1 { first_page } else { None })?;
    }
    Ok(())
}

/// Names of the regular files in `dir`, sorted.
#[allow(dead_code)]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
