//! Fitting source artwork onto the fixed card canvas
//!
//! Both policies preserve alpha and always return an image of exactly the
//! target size:
//! - [`letterbox_fit`] keeps the whole source visible and pads with
//!   transparency (character art, logos)
//! - [`cover_fit`] fills the canvas and crops the overflow (backgrounds)

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resampling filter used for every scale operation
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Which fitting policy to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    Letterbox,
    Cover,
}

/// Fit `source` inside `target`, centred on a transparent canvas.
pub fn letterbox_fit(source: &RgbaImage, target: (u32, u32), allow_upscale: bool) -> RgbaImage {
    let (tw, th) = target;
    let (sw, sh) = source.dimensions();
    let mut scale = f64::min(tw as f64 / sw as f64, th as f64 / sh as f64);
    if !allow_upscale {
        scale = scale.min(1.0);
    }

    let (nw, nh) = scaled_size(source.dimensions(), scale);
    let (nw, nh) = (nw.min(tw), nh.min(th));
    let scaled = resize_if_needed(source, nw, nh);
    if scaled.dimensions() == target {
        return scaled;
    }

    center_on_canvas(&scaled, target)
}

/// Scale `source` to cover `target` and centre-crop the overflow.
///
/// When upscaling is disallowed and the source is still smaller than the
/// target on some axis, the crop is centred on a transparent canvas.
pub fn cover_fit(source: &RgbaImage, target: (u32, u32), allow_upscale: bool) -> RgbaImage {
    let (tw, th) = target;
    let (sw, sh) = source.dimensions();
    let mut scale = f64::max(tw as f64 / sw as f64, th as f64 / sh as f64);
    if !allow_upscale {
        scale = scale.min(1.0);
    }

    let (nw, nh) = scaled_size(source.dimensions(), scale);
    let scaled = resize_if_needed(source, nw, nh);

    let left = nw.saturating_sub(tw) / 2;
    let top = nh.saturating_sub(th) / 2;
    let crop_w = nw.min(tw);
    let crop_h = nh.min(th);
    let cropped = if (left, top, crop_w, crop_h) == (0, 0, nw, nh) {
        scaled
    } else {
        imageops::crop_imm(&scaled, left, top, crop_w, crop_h).to_image()
    };

    if cropped.dimensions() == target {
        return cropped;
    }

    center_on_canvas(&cropped, target)
}

/// Dispatch on [`FitMode`]
pub fn fit(source: &RgbaImage, target: (u32, u32), mode: FitMode, allow_upscale: bool) -> RgbaImage {
    match mode {
        FitMode::Letterbox => letterbox_fit(source, target, allow_upscale),
        FitMode::Cover => cover_fit(source, target, allow_upscale),
    }
}

fn scaled_size((w, h): (u32, u32), scale: f64) -> (u32, u32) {
    let nw = (w as f64 * scale).round().max(1.0) as u32;
    let nh = (h as f64 * scale).round().max(1.0) as u32;
    (nw, nh)
}

fn resize_if_needed(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if source.dimensions() == (width, height) {
        source.clone()
    } else {
        imageops::resize(source, width, height, RESAMPLE_FILTER)
    }
}

fn center_on_canvas(image: &RgbaImage, (tw, th): (u32, u32)) -> RgbaImage {
    let mut canvas = RgbaImage::new(tw, th);
    let x = (tw as i64 - image.width() as i64) / 2;
    let y = (th as i64 - image.height() as i64) / 2;
    imageops::replace(&mut canvas, image, x, y);
    canvas
}
