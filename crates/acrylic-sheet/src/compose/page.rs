use image::imageops;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::knockout::{alpha_channel, knockout_mask, stamp_knockout, stamp_mask};
use crate::layout::{GridPosition, PixelRect, SheetGeometry, framed_bounds};
use crate::normalize::{cover_fit, letterbox_fit};
use crate::options::{LabelPlacement, SheetParams};
use crate::paginate::Page;
use crate::types::{KnockoutPattern, LoadedCard, Result, SheetError};

use super::{LabelRenderer, LayerKind, SheetLayers};

const OPAQUE_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Composite every card of `page` into a fresh set of sheet layers.
pub fn render_page(
    page: &Page,
    params: &SheetParams,
    labels: &dyn LabelRenderer,
) -> Result<SheetLayers> {
    let geometry = &params.geometry;
    let mut layers = SheetLayers::new(geometry.width_px, geometry.height_px);

    for (card, pos) in &page.cards {
        if !fits_on_sheet(geometry, *pos) {
            return Err(SheetError::RenderTask {
                page: page.number,
                reason: format!(
                    "card `{}` at ({}, {}) falls outside the {}x{}px sheet",
                    card.key, pos.x, pos.y, geometry.width_px, geometry.height_px
                ),
            });
        }
        place_card(&mut layers, card, *pos, params, labels);
    }

    Ok(layers)
}

fn fits_on_sheet(geometry: &SheetGeometry, pos: GridPosition) -> bool {
    pos.x < geometry.width_px && pos.y < geometry.height_px
}

/// Place one card at `pos` on every layer it contributes to.
pub fn place_card(
    layers: &mut SheetLayers,
    card: &LoadedCard,
    pos: GridPosition,
    params: &SheetParams,
    labels: &dyn LabelRenderer,
) {
    let card_size = params.card_size();
    let (x, y) = (pos.x as i64, pos.y as i64);

    // Background and its full-card knockout
    if card.has_background {
        let background = cover_fit(&card.background_image, card_size, params.upscale.background);
        imageops::overlay(layers.layer_mut(LayerKind::Background), &background, x, y);
        stamp_card_rect(layers.layer_mut(LayerKind::BackgroundKnockout), pos, card_size);
    }

    // Character artwork
    let character = letterbox_fit(&card.character_image, card_size, params.upscale.character);
    imageops::overlay(layers.layer_mut(LayerKind::Character), &character, x, y);

    // Logo and its knockout, always binary
    if let Some(logo_image) = &card.logo_image {
        let logo = letterbox_fit(logo_image, card_size, params.upscale.logo);
        imageops::overlay(layers.layer_mut(LayerKind::Logos), &logo, x, y);

        let logo_params = params.knockout.with_pattern(KnockoutPattern::Binary);
        let logo_mask = knockout_mask(&alpha_channel(&logo), &logo_params);
        stamp_mask(layers.layer_mut(LayerKind::LogoKnockout), &logo_mask, x, y);
    }

    // Character knockout
    let alpha = alpha_channel(&character);
    let pattern = card.knockout_pattern.unwrap_or(params.knockout.pattern);
    let char_mask = knockout_mask(&alpha, &params.knockout.with_pattern(pattern));
    stamp_knockout(layers.layer_mut(LayerKind::CharKnockout), &char_mask, pattern, x, y);

    // Glare uses the raw silhouette
    stamp_mask(layers.layer_mut(LayerKind::Glare), &alpha, x, y);

    // Cut line
    let framed = framed_bounds(&params.geometry, pos);
    if params.geometry.border_px > 0 {
        draw_cut_line(
            layers.layer_mut(LayerKind::Cutline),
            &framed,
            params.geometry.border_px,
        );
    }

    // Name label in the left gutter
    if let Some(label) = labels.render_label(&card.display_name, card_size.1) {
        let (lx, ly) = label_origin(&framed, label.dimensions(), &params.label);
        imageops::overlay(layers.layer_mut(LayerKind::Labels), &label, lx, ly);
    }
}

/// Fill the card's content rectangle with opaque black
fn stamp_card_rect(layer: &mut RgbaImage, pos: GridPosition, (w, h): (u32, u32)) {
    let rect = Rect::at(pos.x as i32, pos.y as i32).of_size(w, h);
    draw_filled_rect_mut(layer, rect, OPAQUE_BLACK);
}

/// Stroke `border` pixels inward from the framed cell's outer edge, which
/// leaves the card content itself untouched.
pub fn draw_cut_line(layer: &mut RgbaImage, framed: &PixelRect, border: u32) {
    for inset in 0..border {
        let w = framed.width.saturating_sub(2 * inset);
        let h = framed.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((framed.x + inset as i64) as i32, (framed.y + inset as i64) as i32)
            .of_size(w, h);
        draw_hollow_rect_mut(layer, rect, OPAQUE_BLACK);
    }
}

/// Top-left corner of a label of `size` for the framed cell `framed`.
///
/// The label is right-aligned against the cut line minus the label margin,
/// nudged right by the visual shift, kept off the sheet's left edge, and
/// centred on the cut line vertically.
pub fn label_origin(framed: &PixelRect, (lw, lh): (u32, u32), placement: &LabelPlacement) -> (i64, i64) {
    let left = framed.x;
    let top = framed.y;
    let bottom = framed.bottom() - 1;

    let x = (left - placement.margin_px - lw as i64 + placement.right_shift_px)
        .max(placement.min_left_px);
    let y = top + (bottom - top) / 2 - lh as i64 / 2;
    (x, y)
}

/// Alpha channel of a card-sized region of a layer, for inspection
pub fn region_alpha(layer: &RgbaImage, pos: GridPosition, (w, h): (u32, u32)) -> GrayImage {
    GrayImage::from_fn(w, h, |dx, dy| {
        let (px, py) = (pos.x + dx, pos.y + dy);
        if px < layer.width() && py < layer.height() {
            Luma([layer.get_pixel(px, py)[3]])
        } else {
            Luma([0])
        }
    })
}
