//! Layout calculation for card sheets
//!
//! This module handles the geometric side of sheet generation:
//! - Sheet geometry in pixels (margins, spacing, cut-line border)
//! - Grid packing (rows, columns and the anchor of every cell)
//! - Framed cell bounds used for cut lines and overlap checks

mod grid;
mod types;

pub use grid::*;
pub use types::*;
