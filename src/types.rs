//! Core data types, constants and reports for the Tankobon library.
//!
//! This module defines the fundamental data structures used throughout Tankobon:
//! - Scanned input (`VolumeFile`)
//! - The immutable plan (`FileMove`, `BatchPlan`)
//! - Cover resolution outcomes (`CoverResult`, `VolumeCoverResult`, `ResolvedCover`)
//! - Execution outcome (`ExecutionReport`)
//! - Enumerations for settings (`MatchPolicy`)

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::natural::NaturalKey;
use crate::path_utils::get_file_name_lossy;

/// Default number of volumes per batch folder.
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// Default zero-padding width of the volume number in clean names.
pub const DEFAULT_PAD_WIDTH: usize = 3;
/// Recognised volume archive extensions.
pub const VOLUME_EXTENSIONS: &[&str] = &[".cbz", ".cbr", ".cb7", ".zip"];
/// Volume archive extensions that can be listed without unpacking.
pub const RANDOM_ACCESS_EXTENSIONS: &[&str] = &[".cbz", ".zip"];
/// Image extensions accepted as covers and as archive pages.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".bmp", ".gif"];
/// Existing cover files, checked in this order before any other image.
pub const COVER_CANDIDATES: &[&str] = &[
    "cover.jpg",
    "cover.jpeg",
    "cover.png",
    "poster.jpg",
    "poster.png",
    "cover_old.jpg",
];
/// Canonical cover file name, both for the series and for each batch.
pub const COVER_FILE_NAME: &str = "cover.jpg";

/// An archive file found in the series directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeFile {
    path: PathBuf,
    key: NaturalKey,
}

impl VolumeFile {
    pub fn new(path: PathBuf) -> Self {
        let key = NaturalKey::from_path(&path);
        Self { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        get_file_name_lossy(&self.path)
    }

    pub fn key(&self) -> &NaturalKey {
        &self.key
    }
}

impl Ord for VolumeFile {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for VolumeFile {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A planned, not yet applied relocation of one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub dst_name: String,
}

impl FileMove {
    /// Whether the move also changes the file name.
    pub fn is_rename(&self) -> bool {
        get_file_name_lossy(&self.src) != self.dst_name
    }
}

/// One destination folder and the volumes that go into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    /// 1-based batch number, also the number stamped on the cover.
    pub batch_index: usize,
    pub batch_dir: PathBuf,
    /// 1-based ordinal of the first volume of this batch in the whole series.
    pub first_ordinal: usize,
    pub moves: Vec<FileMove>,
    pub will_make_cover: bool,
}

impl BatchPlan {
    /// Ordinal of the last volume in this batch.
    pub fn last_ordinal(&self) -> usize {
        self.first_ordinal + self.moves.len().saturating_sub(1)
    }
}

/// Outcome of a successful remote lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverResult {
    pub source: String,
    pub url: String,
}

/// Descriptor for extracting the cover out of the first volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeCoverResult {
    pub volume_file: PathBuf,
    pub image_entry: String,
    pub output_file: PathBuf,
}

/// Which cascade stage produced the series cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CoverOrigin {
    FirstVolume(VolumeCoverResult),
    LocalFile(PathBuf),
    Remote(CoverResult),
}

/// The series cover, written to the canonical `cover.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCover {
    pub path: PathBuf,
    pub origin: CoverOrigin,
}

impl ResolvedCover {
    /// Short human description of where the cover came from.
    pub fn describe(&self) -> String {
        match &self.origin {
            CoverOrigin::FirstVolume(v) => format!(
                "first volume {}:{}",
                get_file_name_lossy(&v.volume_file),
                v.image_entry
            ),
            CoverOrigin::LocalFile(p) => format!("local file {}", get_file_name_lossy(p)),
            CoverOrigin::Remote(r) => format!("{} ({})", r.source, r.url),
        }
    }
}

/// How strictly remote search results must match the series title.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize)]
pub enum MatchPolicy {
    /// Accept the best-ranked candidate, whatever its score.
    #[default]
    Best,
    /// Accept only candidates whose (normalized or lowercased) title equals the query.
    Exact,
}

/// Summary of an executed plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub batches_completed: usize,
    pub files_moved: usize,
    pub covers_written: usize,
    /// `(batch index, error message)` for every cover that could not be written.
    pub cover_failures: Vec<(usize, String)>,
}
