//! Cover extraction from the first volume archive.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use zip::ZipArchive;

use crate::cover::save_jpeg;
use crate::error::{Error, Result};
use crate::natural::sort_natural;
use crate::path_utils::{get_file_name_lossy, has_extension, has_junk_component};
use crate::types::{IMAGE_EXTENSIONS, RANDOM_ACCESS_EXTENSIONS, VolumeCoverResult};

fn open_archive(volume: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let name = get_file_name_lossy(volume);
    if !has_extension(&name, RANDOM_ACCESS_EXTENSIONS) {
        return Err(Error::Unsupported(format!(
            "Cannot list '{}' without unpacking it",
            name
        )));
    }
    let file = File::open(volume)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Lists the page images of a volume in natural order.
///
/// Directories, `__MACOSX` metadata and hidden entries are skipped.
///
/// # Arguments
///
/// * `volume` - A `.cbz` or `.zip` archive
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Entry names, possibly empty
/// * `Err(Error::Unsupported)` - The archive format needs unpacking to list
pub fn list_image_entries(volume: &Path) -> Result<Vec<String>> {
    let archive = open_archive(volume)?;
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| !has_junk_component(name))
        .filter(|name| has_extension(name, IMAGE_EXTENSIONS))
        .map(str::to_string)
        .collect();
    sort_natural(&mut entries);
    Ok(entries)
}

/// Name of the first page image of a volume, if it has any.
pub fn first_image_entry(volume: &Path) -> Result<Option<String>> {
    Ok(list_image_entries(volume)?.into_iter().next())
}

/// Extracts the first page of `volume` and writes it as a JPEG to `output`.
///
/// # Returns
///
/// * `Ok(Some(VolumeCoverResult))` - The cover was written
/// * `Ok(None)` - The archive has no image entries
/// * `Err(_)` - Unsupported archive type, unreadable archive or undecodable image
pub fn extract_volume_cover(volume: &Path, output: &Path) -> Result<Option<VolumeCoverResult>> {
    let Some(entry) = first_image_entry(volume)? else {
        return Ok(None);
    };

    let mut archive = open_archive(volume)?;
    let mut bytes = Vec::new();
    archive.by_name(&entry)?.read_to_end(&mut bytes)?;
    debug!(
        "Read {} bytes from {}:{}",
        bytes.len(),
        get_file_name_lossy(volume),
        entry
    );

    let image = image::load_from_memory(&bytes)?;
    save_jpeg(&image, output)?;

    Ok(Some(VolumeCoverResult {
        volume_file: volume.to_path_buf(),
        image_entry: entry,
        output_file: output.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDir;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn png_bytes(color: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 6, image::Rgb(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn write_cbz(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_entries_skip_junk_and_sort_naturally() {
        let dir = TestDir::new("volume_entries");
        let cbz = dir.join("Series v1.cbz");
        write_cbz(
            &cbz,
            &[
                ("pages/", Vec::new()),
                ("pages/page10.png", png_bytes([0, 0, 0])),
                ("pages/page2.png", png_bytes([0, 0, 0])),
                ("__MACOSX/pages/._page1.png", vec![0]),
                ("pages/.thumb.png", vec![0]),
                ("ComicInfo.xml", b"<x/>".to_vec()),
            ],
        );
        assert_eq!(
            list_image_entries(&cbz).unwrap(),
            vec!["pages/page2.png", "pages/page10.png"]
        );
    }

    #[test]
    fn test_extract_writes_jpeg() {
        let dir = TestDir::new("volume_extract");
        let cbz = dir.join("Series v1.cbz");
        write_cbz(&cbz, &[("001.png", png_bytes([200, 10, 10]))]);

        let output = dir.join("cover.jpg");
        let result = extract_volume_cover(&cbz, &output).unwrap().unwrap();
        assert_eq!(result.image_entry, "001.png");
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (4, 6));
    }

    #[test]
    fn test_no_images_and_unsupported_type() {
        let dir = TestDir::new("volume_none");
        let cbz = dir.join("Series v1.cbz");
        write_cbz(&cbz, &[("notes.txt", b"hi".to_vec())]);
        assert!(extract_volume_cover(&cbz, &dir.join("cover.jpg")).unwrap().is_none());

        let cbr = dir.join("Series v1.cbr");
        std::fs::write(&cbr, b"Rar!").unwrap();
        assert!(matches!(first_image_entry(&cbr), Err(Error::Unsupported(_))));
    }
}
