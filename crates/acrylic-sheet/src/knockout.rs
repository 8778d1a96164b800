//! Print-white (knockout) mask generation
//!
//! A knockout mask is derived from an artwork alpha channel in two steps:
//! 1. A transfer function ([`KnockoutPattern`]) maps each alpha value to a
//!    white-ink density.
//! 2. If an erosion radius is set, the mask is softened with a small blur and
//!    then shrunk with square grayscale erosion so the white layer stays
//!    strictly inside the visible artwork edge.
//!
//! The finished mask is stamped into a layer as opaque black, either by
//! masked paste (binary masks) or by alpha compositing (graded masks).

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::morphology::{Mask, grayscale_erode};

use crate::types::KnockoutPattern;

/// Pixel-space knockout parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnockoutParams {
    pub pattern: KnockoutPattern,
    pub threshold: u8,
    pub steepness: f32,
    /// Half-width of the square structuring element; `0` disables erosion
    pub erosion_radius: u32,
    /// Gaussian sigma applied before erosion
    pub blur_radius: f32,
}

impl KnockoutParams {
    /// Same parameters with a different transfer function
    pub fn with_pattern(self, pattern: KnockoutPattern) -> Self {
        Self { pattern, ..self }
    }
}

// =============================================================================
// Transfer Functions
// =============================================================================

impl KnockoutPattern {
    /// Map one alpha value to a white-ink density.
    pub fn transfer(self, alpha: u8, threshold: u8, steepness: f32) -> u8 {
        if alpha < threshold {
            return 0;
        }
        match self {
            KnockoutPattern::Binary => 255,
            KnockoutPattern::Gradient => alpha,
            KnockoutPattern::SteepGradient => {
                if threshold == u8::MAX {
                    return 255;
                }
                let normalized = (alpha - threshold) as f32 / (255 - threshold) as f32;
                let steeper = normalized.powf(1.0 / steepness);
                (255.0 * steeper).round().clamp(0.0, 255.0) as u8
            }
        }
    }

    /// Precompute the transfer function for every alpha value
    pub fn lookup_table(self, threshold: u8, steepness: f32) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (alpha, out) in lut.iter_mut().enumerate() {
            *out = self.transfer(alpha as u8, threshold, steepness);
        }
        lut
    }
}

/// Extract the alpha channel of an RGBA image
pub fn alpha_channel(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[3]])
    })
}

/// Apply the transfer function of `pattern` to every pixel of `alpha`
pub fn apply_transfer(
    alpha: &GrayImage,
    pattern: KnockoutPattern,
    threshold: u8,
    steepness: f32,
) -> GrayImage {
    let lut = pattern.lookup_table(threshold, steepness);
    let mut out = alpha.clone();
    for p in out.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    out
}

// =============================================================================
// Morphology
// =============================================================================

/// Morphological erosion with a `(2 * radius + 1)` square structuring element.
///
/// Pixels outside the image are ignored. Radii above `u8::MAX` are applied
/// as successive passes, which compose to the same square element.
pub fn erode(mask: &GrayImage, radius: u32) -> GrayImage {
    let mut out = mask.clone();
    let mut remaining = radius;
    while remaining > 0 {
        let step = remaining.min(u8::MAX as u32);
        out = grayscale_erode(&out, &Mask::square(step as u8));
        remaining -= step;
    }
    out
}

/// Soften a mask edge before erosion; a zero radius is a no-op
pub fn soften(mask: &GrayImage, blur_radius: f32) -> GrayImage {
    if blur_radius > 0.0 {
        imageproc::filter::gaussian_blur_f32(mask, blur_radius)
    } else {
        mask.clone()
    }
}

// =============================================================================
// Mask Generation
// =============================================================================

/// Build the knockout mask for an artwork alpha channel.
pub fn knockout_mask(alpha: &GrayImage, params: &KnockoutParams) -> GrayImage {
    let mask = apply_transfer(alpha, params.pattern, params.threshold, params.steepness);
    if params.erosion_radius == 0 {
        return mask;
    }
    erode(&soften(&mask, params.blur_radius), params.erosion_radius)
}

// =============================================================================
// Stamping
// =============================================================================

/// Paste opaque black through `mask` into `layer` at `(x, y)`.
///
/// Each covered pixel is linearly interpolated toward opaque black by the
/// mask value, alpha included.
pub fn stamp_mask(layer: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64) {
    let (lw, lh) = (layer.width() as i64, layer.height() as i64);
    for (mx, my, m) in mask.enumerate_pixels() {
        let m = m[0] as u32;
        if m == 0 {
            continue;
        }
        let (px, py) = (x + mx as i64, y + my as i64);
        if px < 0 || py < 0 || px >= lw || py >= lh {
            continue;
        }
        let dst = layer.get_pixel_mut(px as u32, py as u32);
        let keep = 255 - m;
        let lerp = |c: u8, target: u32| ((c as u32 * keep + target * m + 127) / 255) as u8;
        *dst = Rgba([
            lerp(dst[0], 0),
            lerp(dst[1], 0),
            lerp(dst[2], 0),
            lerp(dst[3], 255),
        ]);
    }
}

/// Alpha-composite black with per-pixel alpha `mask` over `layer` at `(x, y)`.
///
/// Source-over with straight (non-premultiplied) output, so partially
/// covered pixels keep their intermediate density.
pub fn composite_mask(layer: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64) {
    let (lw, lh) = (layer.width() as i64, layer.height() as i64);
    for (mx, my, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let (px, py) = (x + mx as i64, y + my as i64);
        if px < 0 || py < 0 || px >= lw || py >= lh {
            continue;
        }
        let dst = layer.get_pixel_mut(px as u32, py as u32);
        let src_a = m[0] as f32 / 255.0;
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        // Black contributes nothing to the premultiplied colour
        let carry = dst_a * (1.0 - src_a) / out_a;
        let channel = |c: u8| (c as f32 * carry).round() as u8;
        *dst = Rgba([
            channel(dst[0]),
            channel(dst[1]),
            channel(dst[2]),
            (out_a * 255.0).round() as u8,
        ]);
    }
}

/// Stamp a knockout mask the way its pattern requires.
pub fn stamp_knockout(
    layer: &mut RgbaImage,
    mask: &GrayImage,
    pattern: KnockoutPattern,
    x: i64,
    y: i64,
) {
    if pattern.is_graded() {
        composite_mask(layer, mask, x, y);
    } else {
        stamp_mask(layer, mask, x, y);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const T: u8 = 20;
    const STEEP: f32 = 2.5;

    #[test]
    fn test_binary_transfer() {
        let p = KnockoutPattern::Binary;
        assert_eq!(p.transfer(0, T, STEEP), 0);
        assert_eq!(p.transfer(19, T, STEEP), 0);
        assert_eq!(p.transfer(20, T, STEEP), 255);
        assert_eq!(p.transfer(255, T, STEEP), 255);
    }

    #[test]
    fn test_binary_is_idempotent() {
        for t in 0..=255u8 {
            for a in 0..=255u8 {
                let once = KnockoutPattern::Binary.transfer(a, t, STEEP);
                let twice = KnockoutPattern::Binary.transfer(once, t, STEEP);
                assert_eq!(once, twice, "alpha={} threshold={}", a, t);
            }
        }
    }

    #[test]
    fn test_graded_patterns_zero_below_threshold_and_monotonic() {
        for pattern in [KnockoutPattern::Gradient, KnockoutPattern::SteepGradient] {
            for t in [0u8, 1, 20, 128, 254, 255] {
                let lut = pattern.lookup_table(t, STEEP);
                for a in 0..t {
                    assert_eq!(lut[a as usize], 0, "{:?} a={} t={}", pattern, a, t);
                }
                for a in t..255 {
                    assert!(
                        lut[a as usize] <= lut[a as usize + 1],
                        "{:?} not monotonic at a={} t={}",
                        pattern,
                        a,
                        t
                    );
                }
            }
        }
    }

    #[test]
    fn test_steep_biases_toward_white() {
        let p = KnockoutPattern::SteepGradient;
        assert_eq!(p.transfer(T, T, STEEP), 0);
        assert_eq!(p.transfer(255, T, STEEP), 255);
        let mid = p.transfer(80, T, STEEP);
        assert!(mid > KnockoutPattern::Gradient.transfer(80, T, STEEP));
        // ((80 - 20) / 235) ^ 0.4 * 255
        assert_eq!(mid, 148);
    }

    #[test]
    fn test_erode_shrinks_square() {
        let mut mask = GrayImage::new(9, 9);
        for y in 2..7 {
            for x in 2..7 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let eroded = erode(&mask, 1);
        let white: Vec<(u32, u32)> = eroded
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(white.len(), 9);
        assert!(white.iter().all(|&(x, y)| (3..6).contains(&x) && (3..6).contains(&y)));
    }

    #[test]
    fn test_erode_large_radius_in_passes() {
        // 300 needs more than one u8-sized pass
        let full = GrayImage::from_pixel(6, 5, Luma([255]));
        assert_eq!(erode(&full, 300), full);

        let mut mask = full.clone();
        mask.put_pixel(5, 4, Luma([0]));
        assert!(erode(&mask, 300).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_erode_passes_compose() {
        let mask = GrayImage::from_fn(12, 12, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(erode(&mask, 3), erode(&erode(&mask, 1), 2));
    }

    #[test]
    fn test_erode_keeps_full_mask_at_edges() {
        let mask = GrayImage::from_pixel(5, 4, Luma([255]));
        assert_eq!(erode(&mask, 2), mask);
    }

    #[test]
    fn test_knockout_mask_without_erosion_is_transfer_only() {
        let alpha = GrayImage::from_fn(4, 1, |x, _| Luma([[0, 19, 20, 200][x as usize]]));
        let params = KnockoutParams {
            pattern: KnockoutPattern::Binary,
            threshold: T,
            steepness: STEEP,
            erosion_radius: 0,
            blur_radius: 0.3,
        };
        let mask = knockout_mask(&alpha, &params);
        assert_eq!(mask.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_eroded_mask_stays_inside_artwork() {
        let alpha = GrayImage::from_fn(20, 20, |x, y| {
            if (5..15).contains(&x) && (5..15).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let params = KnockoutParams {
            pattern: KnockoutPattern::Binary,
            threshold: T,
            steepness: STEEP,
            erosion_radius: 1,
            blur_radius: 0.3,
        };
        let mask = knockout_mask(&alpha, &params);
        for (x, y, p) in mask.enumerate_pixels() {
            if alpha.get_pixel(x, y)[0] == 0 {
                assert_eq!(p[0], 0, "white outside artwork at ({}, {})", x, y);
            }
        }
        assert!(mask.get_pixel(10, 10)[0] >= 250);
        assert!(mask.get_pixel(5, 10)[0] < 128);
    }

    #[test]
    fn test_stamp_mask_paints_black() {
        let mut layer = RgbaImage::new(4, 4);
        let mask = GrayImage::from_fn(2, 2, |x, _| Luma([if x == 0 { 255 } else { 128 }]));
        stamp_mask(&mut layer, &mask, 1, 1);

        assert_eq!(*layer.get_pixel(1, 1), Rgba([0, 0, 0, 255]));
        assert_eq!(*layer.get_pixel(2, 1), Rgba([0, 0, 0, 128]));
        assert_eq!(*layer.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*layer.get_pixel(3, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_composite_mask_preserves_density() {
        let mut layer = RgbaImage::new(3, 1);
        let mask = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 100, 255][x as usize]]));
        composite_mask(&mut layer, &mask, 0, 0);

        assert_eq!(layer.get_pixel(0, 0)[3], 0);
        assert_eq!(layer.get_pixel(1, 0)[3], 100);
        assert_eq!(layer.get_pixel(2, 0)[3], 255);
    }
}
