pub mod caption_placer;
pub mod empty_page;
pub mod grid_geometry;
pub mod layout_selector;
pub mod page_range;
pub mod text_box;

pub use caption_placer::{apply_leading, CaptionFrame, CaptionPlacer, CaptionStyle};
pub use empty_page::find_empty_page;
pub use grid_geometry::build_cells;
pub use layout_selector::LayoutSelector;
pub use page_range::{DocumentMerger, Fragment, PageRangeSplitter, SplitResult};
pub use text_box::{build_text_box, TextBoxGeometry};
