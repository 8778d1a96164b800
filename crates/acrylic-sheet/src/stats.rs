use crate::layout::{GridLayout, create_grid_layout};
use crate::options::{SheetOptions, SheetParams};
use crate::types::*;

/// Summary of how a batch lays out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStatistics {
    /// Requests that contribute at least one card
    pub items: usize,
    /// Cards after quantity expansion
    pub cards: usize,
    pub rows: usize,
    pub cols: usize,
    /// Cards per sheet
    pub capacity: usize,
    /// Sheets needed
    pub pages: usize,
}

impl BatchStatistics {
    /// Statistics for `cards` cards from `items` requests on `grid`
    pub fn for_grid(items: usize, cards: usize, grid: &GridLayout, single_page: bool) -> Result<Self> {
        let capacity = grid.capacity();
        if capacity == 0 || (single_page && cards > capacity) {
            return Err(SheetError::CapacityExceeded {
                count: cards,
                capacity,
            });
        }

        let pages = if single_page {
            usize::from(cards > 0)
        } else {
            cards.div_ceil(capacity)
        };

        Ok(Self {
            items,
            cards,
            rows: grid.rows,
            cols: grid.cols,
            capacity,
            pages,
        })
    }
}

/// Calculate the layout of a batch without decoding any images
pub fn calculate_statistics(
    requests: &[CardRequest],
    options: &SheetOptions,
) -> Result<BatchStatistics> {
    let params = SheetParams::from_options(options)?;
    let grid = create_grid_layout(&params.geometry);

    let items = requests.iter().filter(|r| r.quantity > 0).count();
    let cards = requests.iter().map(|r| r.quantity as usize).sum();

    BatchStatistics::for_grid(items, cards, &grid, options.single_page)
}
