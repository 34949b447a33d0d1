pub mod backend;
pub mod input_driver;
pub mod js_executor;
pub mod memory_backend;

pub use backend::{DocumentBackend, DocumentHandle, ItemHandle, PageHandle};
pub use input_driver::{settle, InputDriver, RegionSelector, Unattended};
pub use js_executor::JsExecutor;
pub use memory_backend::MemoryBackend;
