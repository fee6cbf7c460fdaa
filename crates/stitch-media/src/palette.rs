//! Class color palette.

use image::Rgb;

/// A named palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub rgb: Rgb<u8>,
}

/// Colors assigned to stitch classes, in assignment order.
pub const PALETTE: [PaletteColor; 7] = [
    PaletteColor { name: "red", rgb: Rgb([255, 0, 0]) },
    PaletteColor { name: "blue", rgb: Rgb([0, 0, 255]) },
    PaletteColor { name: "green", rgb: Rgb([0, 128, 0]) },
    PaletteColor { name: "orange", rgb: Rgb([255, 165, 0]) },
    PaletteColor { name: "purple", rgb: Rgb([128, 0, 128]) },
    PaletteColor { name: "teal", rgb: Rgb([0, 128, 128]) },
    PaletteColor { name: "brown", rgb: Rgb([165, 42, 42]) },
];

/// Color for the class that was the `first_seen_index`-th distinct class.
///
/// Cycles through [`PALETTE`] when there are more classes than colors.
pub fn color_for(first_seen_index: usize) -> PaletteColor {
    PALETTE[first_seen_index % PALETTE.len()]
}
