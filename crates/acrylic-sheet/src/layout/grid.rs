//! Grid layout calculation
//!
//! This module packs framed cards (card plus cut-line border) into the
//! usable area of a sheet and reports the content anchor of every cell.

use crate::types::{Result, SheetError};

use super::{GridLayout, GridPosition, PixelRect, SheetGeometry};

// =============================================================================
// Grid Creation
// =============================================================================

/// Pack as many framed cards as fit on the sheet.
///
/// `cols = floor((usable_w + spacing) / (framed_w + spacing))`, rows
/// likewise; both are at least 1. Positions are row-major and point at the
/// card content, i.e. `border_px` inside the framed cell.
pub fn create_grid_layout(geometry: &SheetGeometry) -> GridLayout {
    let (framed_w, framed_h) = geometry.framed_size();
    let (usable_w, usable_h) = geometry.usable_size().unwrap_or((0, 0));
    let spacing = geometry.spacing_px;

    let cols = ((usable_w + spacing) / (framed_w + spacing)).max(1) as usize;
    let rows = ((usable_h + spacing) / (framed_h + spacing)).max(1) as usize;

    let mut positions = Vec::with_capacity(rows * cols);
    for row in 0..rows as u32 {
        for col in 0..cols as u32 {
            let x = geometry.left_margin_px + col * (framed_w + spacing) + geometry.border_px;
            let y = geometry.margin_px + row * (framed_h + spacing) + geometry.border_px;
            positions.push(GridPosition::new(x, y));
        }
    }

    GridLayout {
        rows,
        cols,
        positions,
        geometry: *geometry,
    }
}

impl GridLayout {
    /// Pair each item with a grid cell, failing if the sheet is too small.
    pub fn place<T>(&self, items: Vec<T>) -> Result<Vec<(T, GridPosition)>> {
        let capacity = self.capacity();
        if items.len() > capacity {
            return Err(SheetError::CapacityExceeded {
                count: items.len(),
                capacity,
            });
        }
        Ok(items.into_iter().zip(self.positions.iter().copied()).collect())
    }
}

// =============================================================================
// Cell Calculations
// =============================================================================

/// Bounds of the card content area anchored at `pos`.
pub fn card_bounds(geometry: &SheetGeometry, pos: GridPosition) -> PixelRect {
    PixelRect::new(
        pos.x as i64,
        pos.y as i64,
        geometry.card_width_px,
        geometry.card_height_px,
    )
}

/// Bounds of the framed cell (content plus cut-line border) anchored at `pos`.
pub fn framed_bounds(geometry: &SheetGeometry, pos: GridPosition) -> PixelRect {
    let (framed_w, framed_h) = geometry.framed_size();
    let border = geometry.border_px as i64;
    PixelRect::new(pos.x as i64 - border, pos.y as i64 - border, framed_w, framed_h)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_geometry() -> SheetGeometry {
        // 280x580mm at 350 DPI, 2mm cut line, 10mm margin and spacing
        SheetGeometry::uniform(3858, 7992, 768, 1024, 138, 138, 28)
    }

    #[test]
    fn test_scenario_grid() {
        let grid = create_grid_layout(&scenario_geometry());

        assert_eq!(grid.rows, 6);
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.capacity(), 18);
        assert_eq!(grid.positions.len(), 18);
    }

    #[test]
    fn test_positions_are_row_major_content_anchors() {
        let geometry = scenario_geometry();
        let grid = create_grid_layout(&geometry);

        assert_eq!(grid.positions[0], GridPosition::new(138 + 28, 138 + 28));
        // Second column of row 0: framed width 824 plus spacing 138
        assert_eq!(grid.positions[1], GridPosition::new(138 + 962 + 28, 138 + 28));
        // First column of row 1: framed height 1080 plus spacing 138
        assert_eq!(grid.positions[3], GridPosition::new(138 + 28, 138 + 1218 + 28));
    }

    #[test]
    fn test_label_gutter_shifts_columns() {
        let mut geometry = scenario_geometry();
        geometry.left_margin_px = 138 + 689;
        let grid = create_grid_layout(&geometry);

        assert_eq!(grid.cols, 3);
        assert_eq!(grid.positions[0].x, 138 + 689 + 28);
    }

    #[test]
    fn test_oversized_card_still_gets_one_cell() {
        let geometry = SheetGeometry::uniform(100, 100, 500, 500, 5, 5, 1);
        let grid = create_grid_layout(&geometry);

        assert_eq!(grid.rows, 1);
        assert_eq!(grid.cols, 1);
    }

    #[test]
    fn test_place_enforces_capacity() {
        let geometry = SheetGeometry::uniform(100, 100, 40, 40, 5, 5, 0);
        let grid = create_grid_layout(&geometry);
        assert_eq!(grid.capacity(), 4);

        let placed = grid.place(vec!['a', 'b', 'c']).unwrap();
        assert_eq!(placed.len(), 3);
        assert_eq!(placed[2].1, grid.positions[2]);

        match grid.place(vec![0; 5]) {
            Err(SheetError::CapacityExceeded { count, capacity }) => {
                assert_eq!(count, 5);
                assert_eq!(capacity, 4);
            }
            other => panic!("Expected CapacityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_framed_bounds_wrap_content() {
        let geometry = scenario_geometry();
        let pos = GridPosition::new(200, 300);
        let framed = framed_bounds(&geometry, pos);
        let card = card_bounds(&geometry, pos);

        assert_eq!(framed.x, 172);
        assert_eq!(framed.y, 272);
        assert_eq!(framed.right(), card.right() + 28);
        assert_eq!(framed.bottom(), card.bottom() + 28);
    }
}
