//! Volume filename normalization.
//!
//! Turns release names such as `"Series v07 (2019) (Digital) (Group).cbz"` into
//! the canonical `"Series v007.cbz"`. The transformation is a pure function of
//! the raw name and is idempotent.

use lazy_static::lazy_static;
use regex::Regex;

use crate::path_utils::split_extension;
use crate::types::DEFAULT_PAD_WIDTH;

lazy_static! {
    /// A parenthesized group plus the whitespace in front of it.
    static ref PARENS_REGEX: Regex = Regex::new(r"\s*\([^)]*\)").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
    /// Sub-part suffixes glued to a volume marker, e.g. `v071_1_1`.
    static ref VOLUME_SUFFIX_REGEX: Regex = Regex::new(r"(?i)(\bv\s*\d+)(?:_\d+)+").unwrap();
    /// The volume marker itself. Group 1 is the number without leading zeros.
    static ref VOLUME_REGEX: Regex = Regex::new(r"(?i)\bv\s*0*(\d+)").unwrap();
}

/// Removes every parenthesized substring from a stem.
pub fn strip_parentheticals(stem: &str) -> String {
    PARENS_REGEX.replace_all(stem, "").into_owned()
}

/// Collapses whitespace runs to a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Finds the volume marker. Returns the byte offset where it starts and the volume number.
pub fn find_volume_marker(stem: &str) -> Option<(usize, u64)> {
    let caps = VOLUME_REGEX.captures(stem)?;
    let number = caps.get(1)?.as_str().parse::<u64>().ok()?;
    Some((caps.get(0)?.start(), number))
}

/// Normalizes a volume filename with the default padding of three digits.
///
/// # Examples
///
/// ```
/// use tankobon::normalize::clean_volume_filename;
///
/// assert_eq!(clean_volume_filename("Series v7.cbz"), "Series v007.cbz");
/// assert_eq!(clean_volume_filename("Series v071_1_1.cbz"), "Series v071.cbz");
/// ```
pub fn clean_volume_filename(src_name: &str) -> String {
    clean_volume_filename_padded(src_name, DEFAULT_PAD_WIDTH)
}

/// Normalizes a volume filename, zero-padding the volume number to `pad_width` digits.
///
/// The extension is kept verbatim. Names without a volume marker only lose their
/// parentheticals and redundant whitespace; a name that would be left with an
/// empty stem is returned unchanged.
pub fn clean_volume_filename_padded(src_name: &str, pad_width: usize) -> String {
    let (stem_raw, ext) = split_extension(src_name);

    let stem = collapse_whitespace(&strip_parentheticals(&stem_raw));
    let stem = VOLUME_SUFFIX_REGEX.replace_all(&stem, "$1").into_owned();

    match find_volume_marker(&stem) {
        Some((start, number)) => {
            let title = collapse_whitespace(&stem[..start]);
            let marker = format!("v{:0width$}", number, width = pad_width);
            if title.is_empty() {
                format!("{marker}{ext}")
            } else {
                format!("{title} {marker}{ext}")
            }
        }
        None if stem.is_empty() => src_name.to_string(),
        None => format!("{stem}{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_volume_number() {
        assert_eq!(clean_volume_filename("Series v7.cbz"), "Series v007.cbz");
        assert_eq!(clean_volume_filename("Series v0012.cbz"), "Series v012.cbz");
        assert_eq!(clean_volume_filename("Series v1234.cbz"), "Series v1234.cbz");
    }

    #[test]
    fn test_drops_sub_part_suffix() {
        assert_eq!(
            clean_volume_filename("Series v071_1_1.cbz"),
            "Series v071.cbz"
        );
    }

    #[test]
    fn test_removes_parentheticals_and_tail() {
        assert_eq!(
            clean_volume_filename("Series  Name v03 (2019) (Digital) (Group).cbz"),
            "Series Name v003.cbz"
        );
        assert_eq!(
            clean_volume_filename("Series v03 - The Return.cbz"),
            "Series v003.cbz"
        );
    }

    #[test]
    fn test_marker_is_case_insensitive_and_allows_space() {
        assert_eq!(clean_volume_filename("Series V 4.cbr"), "Series v004.cbr");
    }

    #[test]
    fn test_marker_only_name() {
        assert_eq!(clean_volume_filename("v2 (Scan).zip"), "v002.zip");
    }

    #[test]
    fn test_parentheticals_only_name_is_kept() {
        assert_eq!(clean_volume_filename("(2019).cbz"), "(2019).cbz");
        assert_eq!(clean_volume_filename(" (Digital) (Group).zip"), " (Digital) (Group).zip");
        let once = clean_volume_filename("(2019).cbz");
        assert_eq!(clean_volume_filename(&once), once);
    }

    #[test]
    fn test_no_marker_keeps_stem() {
        assert_eq!(
            clean_volume_filename("Oneshot   Special (2020).cbz"),
            "Oneshot Special.cbz"
        );
        // A 'v' inside a word is not a marker.
        assert_eq!(clean_volume_filename("Love2Love.cbz"), "Love2Love.cbz");
    }

    #[test]
    fn test_custom_pad_width() {
        assert_eq!(clean_volume_filename_padded("Series v7.cbz", 2), "Series v07.cbz");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Series v7.cbz",
            "Series v071_1_1.cbz",
            "  Weird   (a(b)c) name v 09 extra.cb7",
            "v3.zip",
            "no marker here (x).cbz",
            "Title v5 (part) v6.cbz",
            "README",
            ".cbz",
        ];
        for input in inputs {
            let once = clean_volume_filename(input);
            let twice = clean_volume_filename(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
