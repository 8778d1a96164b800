use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::path::Path;

use crate::constants::{
    LABEL_CANVAS_HEIGHT_PX, LABEL_FONT_SIZE_PX, LABEL_TEXT_ORIGIN,
};
use crate::types::{Result, SheetError};

/// Renders the name label printed beside each card
///
/// Implementations return an image already oriented for placement (the
/// compositor does not rotate it), or `None` to leave the card unlabelled.
pub trait LabelRenderer: Send + Sync {
    fn render_label(&self, text: &str, card_height_px: u32) -> Option<RgbaImage>;
}

/// Renders nothing; the labels layer is omitted
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabels;

impl LabelRenderer for NoLabels {
    fn render_label(&self, _text: &str, _card_height_px: u32) -> Option<RgbaImage> {
        None
    }
}

/// Draws the label text with a caller-supplied font, rotated to run
/// bottom-to-top along the card's left edge
pub struct FontLabelRenderer {
    font: FontVec,
    size_px: f32,
}

impl FontLabelRenderer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| SheetError::Font(format!("Failed to parse font: {}", e)))?;
        Ok(Self {
            font,
            size_px: LABEL_FONT_SIZE_PX,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    pub fn with_size(mut self, size_px: f32) -> Self {
        self.size_px = size_px;
        self
    }
}

impl LabelRenderer for FontLabelRenderer {
    fn render_label(&self, text: &str, card_height_px: u32) -> Option<RgbaImage> {
        if text.trim().is_empty() {
            return None;
        }
        let mut canvas = RgbaImage::new(card_height_px, LABEL_CANVAS_HEIGHT_PX);
        let (x, y) = LABEL_TEXT_ORIGIN;
        draw_text_mut(
            &mut canvas,
            Rgba([0, 0, 0, 255]),
            x,
            y,
            PxScale::from(self.size_px),
            &self.font,
            text,
        );
        // Quarter turn counter-clockwise
        Some(image::imageops::rotate270(&canvas))
    }
}

impl std::fmt::Debug for FontLabelRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLabelRenderer")
            .field("size_px", &self.size_px)
            .finish_non_exhaustive()
    }
}
