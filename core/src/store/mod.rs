//! Persistence of the drawing collection.
//!
//! Callers never see a fatal error: a failed load reads as "no data" and a
//! failed save is logged and dropped. The `try_*` methods on the concrete
//! stores expose the underlying [`StoreError`].

pub mod json;
pub mod memory;

use std::path::PathBuf;

use crate::model::Drawing;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode drawings from {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode drawings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait DrawingStore: Send {
    /// The persisted collection, or `None` on first run or any failure.
    fn load(&self) -> Option<Vec<Drawing>>;

    /// Replaces the persisted collection. Returns `false` if the write failed.
    fn save(&self, drawings: &[Drawing]) -> bool;
}
