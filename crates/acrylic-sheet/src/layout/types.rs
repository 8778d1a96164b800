//! Layout data types
//!
//! These types sit between the physical options and the compositor: they
//! are computed once per sheet geometry and reused for every page.

use crate::types::{Result, SheetError};

/// Pixel dimensions of a sheet and the cards packed on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGeometry {
    /// Full sheet width
    pub width_px: u32,
    /// Full sheet height
    pub height_px: u32,
    /// Card content width (excluding cut line)
    pub card_width_px: u32,
    /// Card content height (excluding cut line)
    pub card_height_px: u32,
    /// Top, bottom and right margin
    pub margin_px: u32,
    /// Left margin; wider than `margin_px` when a label gutter is reserved
    pub left_margin_px: u32,
    /// Gap between neighbouring framed cells
    pub spacing_px: u32,
    /// Cut-line width drawn around each card
    pub border_px: u32,
}

impl SheetGeometry {
    /// Geometry with the same margin on every side
    pub fn uniform(
        width_px: u32,
        height_px: u32,
        card_width_px: u32,
        card_height_px: u32,
        margin_px: u32,
        spacing_px: u32,
        border_px: u32,
    ) -> Self {
        Self {
            width_px,
            height_px,
            card_width_px,
            card_height_px,
            margin_px,
            left_margin_px: margin_px,
            spacing_px,
            border_px,
        }
    }

    /// Card size plus the cut-line border on both sides
    pub fn framed_size(&self) -> (u32, u32) {
        (
            self.card_width_px + 2 * self.border_px,
            self.card_height_px + 2 * self.border_px,
        )
    }

    /// Usable area inside the margins, `None` if the margins consume the sheet
    pub fn usable_size(&self) -> Option<(u32, u32)> {
        let w = self
            .width_px
            .checked_sub(self.left_margin_px)?
            .checked_sub(self.margin_px)?;
        let h = self.height_px.checked_sub(2 * self.margin_px)?;
        (w > 0 && h > 0).then_some((w, h))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width_px == 0 || self.height_px == 0 {
            return Err(SheetError::Geometry(format!(
                "sheet must have positive size, got {}x{}px",
                self.width_px, self.height_px
            )));
        }
        if self.card_width_px == 0 || self.card_height_px == 0 {
            return Err(SheetError::Geometry(format!(
                "card must have positive size, got {}x{}px",
                self.card_width_px, self.card_height_px
            )));
        }
        if self.left_margin_px < self.margin_px {
            return Err(SheetError::Geometry(format!(
                "left margin {}px is narrower than the sheet margin {}px",
                self.left_margin_px, self.margin_px
            )));
        }
        if self.usable_size().is_none() {
            return Err(SheetError::Geometry(format!(
                "margins leave no usable area on a {}x{}px sheet",
                self.width_px, self.height_px
            )));
        }
        Ok(())
    }
}

/// Top-left pixel anchor of a card's content area (inside its cut line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

impl GridPosition {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A rectangular area in pixels, origin at the sheet's top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// One past the bottom-most row
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Result of packing cards onto a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// Number of card rows
    pub rows: usize,
    /// Number of card columns
    pub cols: usize,
    /// Content anchors in row-major order
    pub positions: Vec<GridPosition>,
    /// The geometry this grid was packed for
    pub geometry: SheetGeometry,
}

impl GridLayout {
    /// Maximum number of cards on one sheet
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }
}
