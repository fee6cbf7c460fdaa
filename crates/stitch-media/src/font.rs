//! Label fonts.
//!
//! Labels are drawn with a TrueType font when one can be loaded, otherwise
//! with a small built-in 5x7 bitmap font. Loading never fails: any problem
//! reading or parsing the font file just selects the bitmap font.
//!
//! The bitmap font covers printable ASCII letters in both cases, digits,
//! `-`, `_`, `.` and space. Any other character is drawn as a blank cell of
//! the usual width.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use tracing::{debug, warn};

/// Horizontal advance of one bitmap glyph, including spacing.
const BITMAP_ADVANCE: i32 = 6;
const BITMAP_HEIGHT: usize = 7;

/// Font used for detection labels.
pub enum LabelFont {
    Scalable { font: FontVec, size: f32 },
    Bitmap,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::Scalable { size, .. } => {
                f.debug_struct("Scalable").field("size", size).finish()
            }
            LabelFont::Bitmap => f.write_str("Bitmap"),
        }
    }
}

impl LabelFont {
    /// Try the TrueType font at `path`, falling back to the bitmap font.
    pub fn load(path: Option<&Path>, size: f32) -> Self {
        let Some(path) = path else {
            debug!("No label font configured, using bitmap font");
            return LabelFont::Bitmap;
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Label font unavailable, using bitmap font");
                return LabelFont::Bitmap;
            }
        };

        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path = %path.display(), size, "Loaded label font");
                LabelFont::Scalable { font, size }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Label font invalid, using bitmap font");
                LabelFont::Bitmap
            }
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, LabelFont::Scalable { .. })
    }

    /// Draw `text` with its top-left corner at (`x`, `y`). Pixels outside the
    /// image are skipped.
    pub fn draw(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            LabelFont::Scalable { font, size } => {
                draw_text_mut(image, color, x, y, PxScale::from(*size), font, text);
            }
            LabelFont::Bitmap => draw_bitmap_text(image, x, y, text, color),
        }
    }
}

fn draw_bitmap_text(image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let mut pen_x = x;

    for ch in text.chars() {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                let py = y + row as i32;
                if py < 0 || py >= height {
                    continue;
                }
                for col in 0..5 {
                    if (pattern >> (4 - col)) & 1 == 1 {
                        let px = pen_x + col;
                        if px >= 0 && px < width {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        pen_x += BITMAP_ADVANCE;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; BITMAP_HEIGHT]> {
    let glyph = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        'a' => [0, 0, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'b' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110],
        'c' => [0, 0, 0b01110, 0b10000, 0b10000, 0b10001, 0b01110],
        'd' => [0b00001, 0b00001, 0b01101, 0b10011, 0b10001, 0b10001, 0b01111],
        'e' => [0, 0, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'f' => [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01000, 0b01000],
        'g' => [0, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        'h' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'i' => [0b00100, 0, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'j' => [0b00010, 0, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100],
        'k' => [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
        'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'm' => [0, 0, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'n' => [0, 0, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'o' => [0, 0, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'p' => [0, 0, 0b11110, 0b10001, 0b11110, 0b10000, 0b10000],
        'q' => [0, 0, 0b01101, 0b10011, 0b01111, 0b00001, 0b00001],
        'r' => [0, 0, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        's' => [0, 0, 0b01110, 0b10000, 0b01110, 0b00001, 0b11110],
        't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
        'u' => [0, 0, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101],
        'v' => [0, 0, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'w' => [0, 0, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010],
        'x' => [0, 0, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001],
        'y' => [0, 0, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110],
        'z' => [0, 0, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '_' => [0, 0, 0, 0, 0, 0, 0b11111],
        '.' => [0, 0, 0, 0, 0, 0b00110, 0b00110],
        ' ' => [0; BITMAP_HEIGHT],
        _ => return None,
    };
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    fn count_color(image: &RgbImage, color: Rgb<u8>) -> usize {
        image.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn test_no_path_selects_bitmap() {
        assert!(!LabelFont::load(None, 12.0).is_scalable());
    }

    #[test]
    fn test_missing_file_selects_bitmap() {
        let font = LabelFont::load(Some(Path::new("/nonexistent/arial.ttf")), 12.0);
        assert!(!font.is_scalable());
    }

    #[test]
    fn test_invalid_font_selects_bitmap() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a font").unwrap();

        let font = LabelFont::load(Some(file.path()), 12.0);
        assert!(!font.is_scalable());
    }

    #[test]
    fn test_bitmap_text_draws_pixels() {
        let mut image = RgbImage::from_pixel(40, 20, WHITE);
        LabelFont::Bitmap.draw(&mut image, 2, 2, "sc", RED);

        assert!(count_color(&image, RED) > 0);
        // lowercase 's' starts at the x-height: rows 0-1 empty, row 2 is 0b01110
        assert_eq!(image.get_pixel(3, 2), &WHITE);
        assert_eq!(image.get_pixel(2, 4), &WHITE);
        assert_eq!(image.get_pixel(3, 4), &RED);
    }

    #[test]
    fn test_bitmap_text_keeps_case() {
        let mut lower = RgbImage::from_pixel(40, 10, WHITE);
        let mut upper = RgbImage::from_pixel(40, 10, WHITE);
        LabelFont::Bitmap.draw(&mut lower, 0, 0, "dc", RED);
        LabelFont::Bitmap.draw(&mut upper, 0, 0, "DC", RED);

        assert_ne!(lower, upper);
    }

    #[test]
    fn test_every_ascii_letter_has_a_glyph() {
        for ch in ('a'..='z').chain('A'..='Z') {
            let glyph = glyph_bits(ch).unwrap_or_else(|| panic!("no glyph for {ch:?}"));
            assert!(glyph.iter().any(|row| *row != 0), "empty glyph for {ch:?}");
        }
    }

    #[test]
    fn test_non_ascii_draws_blank_cell() {
        let mut accented = RgbImage::from_pixel(40, 10, WHITE);
        let mut spaced = RgbImage::from_pixel(40, 10, WHITE);
        LabelFont::Bitmap.draw(&mut accented, 0, 0, "\u{e9}sc", RED);
        LabelFont::Bitmap.draw(&mut spaced, 0, 0, " sc", RED);

        assert_eq!(accented, spaced);
    }

    /// Common locations of a TrueType font; the first one present is used.
    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_font() -> Option<&'static Path> {
        SYSTEM_FONTS.iter().map(Path::new).find(|p| p.is_file())
    }

    #[test]
    fn test_truetype_font_draws_text() {
        let Some(path) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };

        let font = LabelFont::load(Some(path), 12.0);
        assert!(font.is_scalable());

        let mut image = RgbImage::from_pixel(60, 20, WHITE);
        font.draw(&mut image, 2, 2, "hdc", RED);

        let mut bitmap = RgbImage::from_pixel(60, 20, WHITE);
        LabelFont::Bitmap.draw(&mut bitmap, 2, 2, "hdc", RED);

        assert!(image.pixels().any(|p| *p != WHITE));
        assert_ne!(image, bitmap);
    }

    #[test]
    fn test_truetype_text_clips_at_edges() {
        let Some(path) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };

        let font = LabelFont::load(Some(path), 12.0);
        let mut image = RgbImage::from_pixel(10, 10, WHITE);
        font.draw(&mut image, -20, -6, "slst", RED);
        font.draw(&mut image, 6, 6, "slst", RED);

        assert_eq!(image.dimensions(), (10, 10));
    }

    #[test]
    fn test_bitmap_text_clips_at_edges() {
        let mut image = RgbImage::from_pixel(10, 10, WHITE);
        LabelFont::Bitmap.draw(&mut image, -3, -4, "hdc", RED);
        LabelFont::Bitmap.draw(&mut image, 8, 8, "slst", RED);

        assert_eq!(image.dimensions(), (10, 10));
        assert!(count_color(&image, RED) > 0);
    }

    #[test]
    fn test_unknown_glyphs_still_advance() {
        let mut a = RgbImage::from_pixel(40, 10, WHITE);
        let mut b = RgbImage::from_pixel(40, 10, WHITE);
        LabelFont::Bitmap.draw(&mut a, 0, 0, "?x", RED);
        LabelFont::Bitmap.draw(&mut b, 0, 0, " x", RED);

        assert_eq!(a, b);
    }
}
