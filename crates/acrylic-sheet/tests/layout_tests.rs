use acrylic_sheet::layout::{framed_bounds, PixelRect};
use acrylic_sheet::*;

fn framed_cells(grid: &GridLayout) -> Vec<PixelRect> {
    grid.positions
        .iter()
        .map(|pos| framed_bounds(&grid.geometry, *pos))
        .collect()
}

/// Largest `n` with `n * cell + (n - 1) * spacing <= available`
fn max_fit(available: u32, cell: u32, spacing: u32) -> usize {
    ((available + spacing) / (cell + spacing)) as usize
}

#[test]
fn test_grid_packing_properties() {
    let sheets = [(300, 400), (1000, 700), (3858, 7992)];
    let cards = [(40, 60), (100, 100), (768, 1024)];
    let margins = [0, 5, 138];
    let spacings = [0, 3, 138];
    let borders = [0, 1, 28];

    let mut checked = 0;
    for &(sw, sh) in &sheets {
        for &(cw, ch) in &cards {
            for &margin in &margins {
                for &spacing in &spacings {
                    for &border in &borders {
                        let geometry =
                            SheetGeometry::uniform(sw, sh, cw, ch, margin, spacing, border);
                        if geometry.validate().is_err() {
                            continue;
                        }
                        check_grid(&geometry);
                        checked += 1;
                    }
                }
            }
        }
    }
    assert!(checked > 100);
}

fn check_grid(geometry: &SheetGeometry) {
    let grid = create_grid_layout(geometry);
    let cells = framed_cells(&grid);
    let (fw, fh) = geometry.framed_size();
    let (uw, uh) = geometry.usable_size().unwrap();
    let ctx = format!("{:?}", geometry);

    assert_eq!(cells.len(), grid.capacity(), "{}", ctx);
    assert!(grid.rows >= 1 && grid.cols >= 1, "{}", ctx);

    // Row-major neighbours never overlap
    for (i, cell) in cells.iter().enumerate() {
        if (i + 1) % grid.cols != 0 {
            assert!(cells[i + 1].x >= cell.right(), "{}", ctx);
        }
        if i + grid.cols < cells.len() {
            assert!(cells[i + grid.cols].y >= cell.bottom(), "{}", ctx);
        }
    }
    if cells.len() <= 200 {
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.intersects(b), "{} overlaps: {:?} {:?}", ctx, a, b);
            }
        }
    }

    // When a card fits at all, the packing is exactly maximal and inside the
    // usable area
    let left = geometry.left_margin_px as i64;
    let top = geometry.margin_px as i64;
    if fw <= uw {
        assert_eq!(grid.cols, max_fit(uw, fw, geometry.spacing_px), "{}", ctx);
        for cell in &cells {
            assert!(cell.x >= left && cell.right() <= left + uw as i64, "{}", ctx);
        }
        let one_more = (grid.cols as u32 + 1) * fw + grid.cols as u32 * geometry.spacing_px;
        assert!(one_more > uw, "{}", ctx);
    } else {
        assert_eq!(grid.cols, 1, "{}", ctx);
    }
    if fh <= uh {
        assert_eq!(grid.rows, max_fit(uh, fh, geometry.spacing_px), "{}", ctx);
        for cell in &cells {
            assert!(cell.y >= top && cell.bottom() <= top + uh as i64, "{}", ctx);
        }
    } else {
        assert_eq!(grid.rows, 1, "{}", ctx);
    }
}

#[test]
fn test_anchor_is_content_origin() {
    let geometry = SheetGeometry::uniform(500, 500, 50, 80, 10, 4, 3);
    let grid = create_grid_layout(&geometry);

    for pos in &grid.positions {
        let framed = framed_bounds(&geometry, *pos);
        assert_eq!(framed.x + 3, pos.x as i64);
        assert_eq!(framed.y + 3, pos.y as i64);
        assert_eq!(framed.width, 56);
        assert_eq!(framed.height, 86);
    }
}

#[test]
fn test_grid_with_label_gutter() {
    let mut geometry = SheetGeometry::uniform(500, 300, 50, 80, 10, 10, 2);
    let without = create_grid_layout(&geometry);
    geometry.left_margin_px = 200;
    let with = create_grid_layout(&geometry);

    assert!(with.cols < without.cols);
    assert_eq!(with.rows, without.rows);
    assert_eq!(with.positions[0].x, 202);
    assert_eq!(with.positions[0].y, 12);
}

#[test]
fn test_invalid_geometry() {
    let geometry = SheetGeometry::uniform(100, 100, 0, 10, 5, 5, 1);
    assert!(matches!(geometry.validate(), Err(SheetError::Geometry(_))));

    let geometry = SheetGeometry::uniform(100, 100, 10, 10, 50, 5, 1);
    assert!(matches!(geometry.validate(), Err(SheetError::Geometry(_))));

    let mut geometry = SheetGeometry::uniform(100, 100, 10, 10, 5, 5, 1);
    geometry.left_margin_px = 2;
    assert!(matches!(geometry.validate(), Err(SheetError::Geometry(_))));
}
