//! Natural ("human") ordering for file names.
//!
//! A name is split into alternating text and digit runs. Digit runs compare as
//! integers of any length, text runs compare case-insensitively, so `vol 2`
//! sorts before `vol 10`.

use std::cmp::Ordering;
use std::path::Path;

use crate::path_utils::get_file_name_lossy;

/// One run of a [`NaturalKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    /// Lowercased non-digit run.
    Text(String),
    /// Digit run with leading zeros stripped, compared by magnitude.
    Number(Digits),
}

/// An arbitrarily long unsigned integer kept in its decimal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digits(String);

impl Digits {
    fn new(run: &str) -> Self {
        let trimmed = run.trim_start_matches('0');
        Digits(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        // No leading zeros, so the longer run is the larger number.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order-preserving key for natural sorting.
///
/// The key always starts with a (possibly empty) text run and alternates from
/// there, so parts at the same position are always of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<KeyPart>);

impl NaturalKey {
    /// Builds the key for a name.
    pub fn new(name: &str) -> Self {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut digits = String::new();

        for c in name.chars() {
            if c.is_ascii_digit() {
                if digits.is_empty() {
                    parts.push(KeyPart::Text(std::mem::take(&mut text).to_lowercase()));
                }
                digits.push(c);
            } else {
                if !digits.is_empty() {
                    parts.push(KeyPart::Number(Digits::new(&digits)));
                    digits.clear();
                }
                text.push(c);
            }
        }

        if !digits.is_empty() {
            parts.push(KeyPart::Number(Digits::new(&digits)));
        } else {
            parts.push(KeyPart::Text(text.to_lowercase()));
        }

        NaturalKey(parts)
    }

    /// Builds the key from a path's file name.
    pub fn from_path(path: &Path) -> Self {
        Self::new(&get_file_name_lossy(path))
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

/// Compares two names naturally, falling back to the raw names so that the
/// order is total for distinct inputs (`v01` and `v1` are not equal).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a)
        .cmp(&NaturalKey::new(b))
        .then_with(|| a.cmp(b))
}

/// Sorts names in place by [`natural_cmp`].
pub fn sort_natural<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

/// Sorts paths in place by the natural order of their file names.
pub fn sort_paths_natural<P: AsRef<Path>>(paths: &mut [P]) {
    paths.sort_by(|a, b| {
        natural_cmp(
            &get_file_name_lossy(a.as_ref()),
            &get_file_name_lossy(b.as_ref()),
        )
    });
}
