//! Label faces: the things that can measure and draw the batch number.
//!
//! Both faces measure exactly the pixels they later paint, so a label drawn at
//! an integer offset lands precisely on the measured box shifted by that offset.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, GlyphId, OutlinedGlyph, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use log::{debug, warn};

use crate::error::{Error, Result};

/// Bold system fonts tried when no font is configured, in order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Black.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Black.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Impact.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "C:\\Windows\\Fonts\\ariblk.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Pixel box of a label's ink, relative to the draw origin. Half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl InkBox {
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }

    fn union(self, other: InkBox) -> InkBox {
        InkBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Something that can render a short label at an integer pixel size.
pub trait LabelFace {
    /// Ink box of `text` at `size`, or `None` when nothing would be drawn.
    fn measure(&self, text: &str, size: u32) -> Option<InkBox>;

    /// Paints `text` with its layout origin at `origin`.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>);

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// A glyph outlined at pen position zero, plus its whole-pixel pen offset.
struct PlacedGlyph {
    ch: char,
    offset: i32,
    outline: OutlinedGlyph,
}

impl PlacedGlyph {
    fn ink(&self) -> InkBox {
        let bounds = self.outline.px_bounds();
        InkBox {
            min_x: bounds.min.x.floor() as i32 + self.offset,
            min_y: bounds.min.y.floor() as i32,
            max_x: bounds.max.x.ceil() as i32 + self.offset,
            max_y: bounds.max.y.ceil() as i32,
        }
    }
}

/// A TrueType/OpenType font rendered with `ab_glyph`.
pub struct TrueTypeFace {
    font: FontVec,
    source: PathBuf,
}

impl TrueTypeFace {
    /// Loads a font file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Loads the first usable font from [`SYSTEM_FONT_CANDIDATES`].
    pub fn system() -> Result<Self> {
        SYSTEM_FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load(path) {
                Ok(face) => Some(face),
                Err(e) => {
                    debug!("Skipping font {}: {}", path.display(), e);
                    None
                }
            })
            .ok_or_else(|| Error::Font("No usable system font found".to_string()))
    }

    /// Lays out `text` with pen positions rounded to whole pixels.
    ///
    /// Each glyph is outlined exactly where `draw_text_mut` places a lone
    /// character, so painting glyph by glyph reproduces the measured ink.
    fn layout(&self, text: &str, size: u32) -> Vec<PlacedGlyph> {
        let scale = PxScale::from(size as f32);
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        let mut glyphs = Vec::new();

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let offset = caret.round() as i32;
            let glyph = id.with_scale_and_position(scale, point(0.0, scaled.ascent()));
            caret += scaled.h_advance(id);
            previous = Some(id);
            if let Some(outline) = self.font.outline_glyph(glyph) {
                glyphs.push(PlacedGlyph { ch, offset, outline });
            }
        }
        glyphs
    }
}

impl LabelFace for TrueTypeFace {
    fn measure(&self, text: &str, size: u32) -> Option<InkBox> {
        self.layout(text, size)
            .iter()
            .map(PlacedGlyph::ink)
            .reduce(InkBox::union)
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>) {
        let scale = PxScale::from(size as f32);
        let mut buf = [0u8; 4];
        for glyph in self.layout(text, size) {
            draw_text_mut(
                canvas,
                color,
                origin.0 + glyph.offset,
                origin.1,
                scale,
                &self.font,
                glyph.ch.encode_utf8(&mut buf),
            );
        }
    }

    fn describe(&self) -> String {
        format!("font {}", self.source.display())
    }
}

/// Seven-segment style digits drawn from rectangles.
///
/// Needs no font file. Digits and `-` get segments; spaces only advance;
/// any other character is drawn as a solid block.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentFace;

/// Segment flags in `a b c d e f g` order.
const DIGIT_SEGMENTS: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],
    [false, true, true, false, false, false, false],
    [true, true, false, true, true, false, true],
    [true, true, true, true, false, false, true],
    [false, true, true, false, false, true, true],
    [true, false, true, true, false, true, true],
    [true, false, true, true, true, true, true],
    [true, true, true, false, false, false, false],
    [true, true, true, true, true, true, true],
    [true, true, true, true, false, true, true],
];

impl SegmentFace {
    fn metrics(size: u32) -> (i32, i32, i32) {
        let height = size as i32;
        let width = (height * 3 / 5).max(3);
        let stroke = (height / 8).max(1);
        (width, height, stroke)
    }

    /// Filled rectangles `(x0, y0, x1, y1)` making up `text` at `size`.
    fn rects(text: &str, size: u32) -> Vec<(i32, i32, i32, i32)> {
        let (w, h, t) = Self::metrics(size);
        let mid = h / 2;
        let mut rects = Vec::new();
        let mut cx = 0;

        for ch in text.chars() {
            let segments = [
                (cx, 0, cx + w, t),
                (cx + w - t, 0, cx + w, (mid + t).min(h)),
                (cx + w - t, mid, cx + w, h),
                (cx, h - t, cx + w, h),
                (cx, mid, cx + t, h),
                (cx, 0, cx + t, (mid + t).min(h)),
                (cx, mid - t / 2, cx + w, mid - t / 2 + t),
            ];
            match ch {
                '0'..='9' => {
                    let digit = ch as usize - '0' as usize;
                    for (on, rect) in DIGIT_SEGMENTS[digit].iter().zip(segments) {
                        if *on {
                            rects.push(rect);
                        }
                    }
                }
                '-' => rects.push(segments[6]),
                c if c.is_whitespace() => {}
                _ => rects.push((cx, 0, cx + w, h)),
            }
            cx += w + t;
        }
        rects
    }
}

impl LabelFace for SegmentFace {
    fn measure(&self, text: &str, size: u32) -> Option<InkBox> {
        Self::rects(text, size)
            .into_iter()
            .map(|(x0, y0, x1, y1)| InkBox {
                min_x: x0,
                min_y: y0,
                max_x: x1,
                max_y: y1,
            })
            .reduce(InkBox::union)
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>) {
        for (x0, y0, x1, y1) in Self::rects(text, size) {
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            let rect = Rect::at(x0 + origin.0, y0 + origin.1)
                .of_size((x1 - x0) as u32, (y1 - y0) as u32);
            draw_filled_rect_mut(canvas, rect, color);
        }
    }

    fn describe(&self) -> String {
        "built-in segment digits".to_string()
    }
}

/// Picks the face used for numbering.
///
/// The configured font wins; otherwise the first system font; otherwise
/// [`SegmentFace`], so numbering never fails for lack of a font.
pub fn load_face(font_path: Option<&Path>) -> Box<dyn LabelFace> {
    if let Some(path) = font_path {
        match TrueTypeFace::load(path) {
            Ok(face) => return Box::new(face),
            Err(e) => warn!("[WARN] Could not load font {}: {}", path.display(), e),
        }
    }
    match TrueTypeFace::system() {
        Ok(face) => Box::new(face),
        Err(e) => {
            debug!("{e}; using segment digits");
            Box::new(SegmentFace)
        }
    }
}
