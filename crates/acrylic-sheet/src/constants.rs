//! Shared constants for sheet generation
//!
//! This module centralizes the physical defaults and magic numbers used
//! throughout layout, knockout generation and label placement. Everything
//! physical is expressed in millimetres and converted to pixels once, when
//! [`SheetParams`](crate::SheetParams) is derived from the options.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Print resolution of every output layer (dots per inch)
pub const PRINT_DPI: u32 = 350;

/// Millimetres per inch
pub const MM_PER_INCH: f32 = 25.4;

/// Convert millimetres to whole pixels at the given resolution
#[inline]
pub fn mm_to_px(mm: f32, dpi: u32) -> i64 {
    (mm / MM_PER_INCH * dpi as f32).round() as i64
}

/// Convert pixels back to millimetres at the given resolution
#[inline]
pub fn px_to_mm(px: i64, dpi: u32) -> f32 {
    px as f32 * MM_PER_INCH / dpi as f32
}

/// Pixels per metre, as stored in a PNG `pHYs` chunk
#[inline]
pub fn dpi_to_pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f32 / MM_PER_INCH * 1000.0).round() as u32
}

// =============================================================================
// Card and Sheet Defaults
// =============================================================================

/// Card canvas width in pixels
pub const DEFAULT_CARD_WIDTH_PX: u32 = 768;

/// Card canvas height in pixels
pub const DEFAULT_CARD_HEIGHT_PX: u32 = 1024;

/// Default physical sheet size (width, height) in millimetres
pub const DEFAULT_SHEET_MM: (f32, f32) = (280.0, 580.0);

/// Width of the stroked cut line around each card (mm)
pub const DEFAULT_CUTLINE_MM: f32 = 2.0;

/// Outer sheet margin (mm)
pub const DEFAULT_MARGIN_MM: f32 = 10.0;

/// Gap between neighbouring framed cards (mm)
pub const DEFAULT_SPACING_MM: f32 = 10.0;

/// Extra left gutter reserved for the rotated name labels (mm)
pub const DEFAULT_LABEL_GUTTER_MM: f32 = 50.0;

// =============================================================================
// Knockout
// =============================================================================

/// Alpha values below this never print white
pub const DEFAULT_KNOCKOUT_THRESHOLD: u8 = 20;

/// How far the white layer is pulled inside the artwork edge (mm)
pub const DEFAULT_KNOCKOUT_SHRINK_MM: f32 = 0.1;

/// Exponent denominator of the steep transfer curve
pub const DEFAULT_STEEPNESS: f32 = 2.5;

/// Gaussian sigma used to soften the mask edge before erosion (px)
pub const DEFAULT_EROSION_BLUR_RADIUS: f32 = 0.3;

// =============================================================================
// Labels
// =============================================================================

/// Gap between the label and the cut line (mm)
pub const LABEL_MARGIN_MM: f32 = 5.0;

/// Rightward nudge applied after right-aligning the label to the cut line (px)
pub const LABEL_RIGHT_SHIFT_PX: i64 = 240;

/// Labels never start closer than this to the sheet's left edge (px)
pub const LABEL_MIN_LEFT_PX: i64 = 10;

/// Font size used by [`FontLabelRenderer`](crate::FontLabelRenderer) (px)
pub const LABEL_FONT_SIZE_PX: f32 = 100.0;

/// Height of the unrotated label canvas (px); its width is the card height
pub const LABEL_CANVAS_HEIGHT_PX: u32 = 600;

/// Text origin inside the unrotated label canvas (px)
pub const LABEL_TEXT_ORIGIN: (i32, i32) = (20, 300);

// =============================================================================
// Workers
// =============================================================================

/// Upper bound on the default worker count of either phase
pub const DEFAULT_MAX_WORKERS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_px_at_print_dpi() {
        assert_eq!(mm_to_px(25.4, PRINT_DPI), 350);
        assert_eq!(mm_to_px(2.0, PRINT_DPI), 28);
        assert_eq!(mm_to_px(10.0, PRINT_DPI), 138);
        assert_eq!(mm_to_px(280.0, PRINT_DPI), 3858);
        assert_eq!(mm_to_px(580.0, PRINT_DPI), 7992);
        assert_eq!(mm_to_px(0.1, PRINT_DPI), 1);
    }

    #[test]
    fn test_pixels_per_meter() {
        assert_eq!(dpi_to_pixels_per_meter(350), 13780);
        assert_eq!(dpi_to_pixels_per_meter(254), 10000);
    }
}
