pub mod compose;
pub mod constants;
pub mod execute;
pub mod io;
pub mod knockout;
pub mod layout;
pub mod normalize;
mod options;
pub mod paginate;
mod stats;
mod types;

pub use compose::{FontLabelRenderer, LabelRenderer, LayerKind, NoLabels, SheetLayers, render_page};
pub use execute::{BatchReport, LoadOutcome, PageOutput, load_cards, load_cards_serial, run_batch};
#[cfg(feature = "serde")]
pub use io::load_requests;
pub use knockout::KnockoutParams;
pub use layout::{GridLayout, GridPosition, SheetGeometry, create_grid_layout};
pub use options::*;
pub use paginate::Page;
pub use stats::{BatchStatistics, calculate_statistics};
pub use types::*;
