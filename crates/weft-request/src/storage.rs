use std::sync::LazyLock;

use weft_context::ContextStorage;

use crate::request_context::RequestContext;

pub type RequestContextStorage = ContextStorage<RequestContext>;

/// Process-wide storage for inbound request metadata, ready for middleware
/// to wrap each unit of work with
/// [`run_with_context`](ContextStorage::run_with_context).
///
/// Initialized once, never torn down. The storage itself is immutable; only
/// the context values it binds are per-execution mutable state.
pub static REQUEST_CONTEXT: LazyLock<RequestContextStorage> =
    LazyLock::new(|| ContextStorage::named(RequestContext::new, "Request context"));

/// A separate request storage with its own diagnostic name, for embedders
/// that scope more than one kind of inbound work. Bindings are independent
/// of [`REQUEST_CONTEXT`].
pub fn request_storage(name: impl Into<String>) -> RequestContextStorage {
    ContextStorage::named(RequestContext::new, name)
}

/// The id of the request currently being handled, if any. Meant for tagging
/// log lines and trace spans.
pub fn current_request_id() -> Option<String> {
    REQUEST_CONTEXT.with_context(|context| context.request_id.clone())
}
