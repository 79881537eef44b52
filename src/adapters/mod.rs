// Adapters layer: concrete storage backends for reference data.

pub mod storage;

pub use storage::{LocalStorage, MemoryStorage};
