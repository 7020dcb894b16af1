//! Request-scoped context propagation: a [`RequestContext`] stamped per
//! inbound unit of work, bound through [`weft_context`]'s storage engine.

pub mod request_context;
pub mod storage;
pub mod telemetry;

pub use request_context::{RequestContext, RequestContextPatch};
pub use storage::{current_request_id, request_storage, RequestContextStorage, REQUEST_CONTEXT};

pub use weft_context::{propagate, ContextMissing, ContextPatch, ContextStorage};
