pub mod batch_loader;

pub use batch_loader::{is_image_file, load_caption, load_image_batches};
