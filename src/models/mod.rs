pub mod caption;
pub mod document;
pub mod geometry;
pub mod layout;
pub mod loaders;
pub mod project;

pub use caption::{AnchorPolicy, CaptionMode, CaptionSpec};
pub use document::{Document, ItemKind, Page, PlacedItem, TextStyle};
pub use geometry::{Point, RatioRegion, Rect, Region};
pub use layout::{LayoutArrangement, LayoutWeights};
pub use loaders::load_image_batches;
pub use project::ImageBatch;
