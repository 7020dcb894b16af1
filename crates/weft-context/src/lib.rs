//! Continuation-local context storage for tokio services.

pub mod error;
pub mod patch;
pub mod storage;

pub use error::ContextMissing;
pub use patch::ContextPatch;
pub use storage::{propagate, ContextStorage, DEFAULT_STORAGE_NAME};
