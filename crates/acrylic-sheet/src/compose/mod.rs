//! Layer compositing for one physical sheet
//!
//! Each page owns a [`SheetLayers`] set. Cards are placed one at a time:
//! normalized artwork is pasted, knockout and glare masks are stamped, the
//! cut line is stroked and the name label is placed in the left gutter.

mod label;
mod layers;
mod page;

pub use label::*;
pub use layers::*;
pub use page::*;
