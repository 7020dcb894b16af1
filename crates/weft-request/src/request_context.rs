use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use weft_context::ContextPatch;

/// Metadata for one inbound unit of work.
///
/// `request_id`, `started_at` and `started_at_timestamp` are stamped at
/// creation and immutable by convention: [`RequestContextPatch`] has no
/// members for them, so they cannot be overwritten through a partial update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContext {
    /// Opaque unique identifier (v4 UUID text).
    pub request_id: String,

    /// Wall-clock start instant, RFC 3339 with millisecond precision.
    pub started_at: String,

    /// The same instant as epoch milliseconds. Both timestamps come from a
    /// single clock read and agree with each other.
    pub started_at_timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            request_id: Uuid::new_v4().to_string(),
            started_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            started_at_timestamp: now.timestamp_millis(),
            user_id: None,
            tenant_id: None,
            token: None,
        }
    }

    /// A fresh context with caller-supplied identity fields already merged.
    pub fn with_fields(fields: RequestContextPatch) -> Self {
        let mut context = Self::new();
        fields.apply_to(&mut context);
        context
    }

    /// Milliseconds since this request started.
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now().timestamp_millis() - self.started_at_timestamp
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial update for the optional identity fields. `None` leaves a field
/// untouched; a patch can set a field but not clear it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestContextPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ContextPatch<RequestContext> for RequestContextPatch {
    fn apply_to(self, context: &mut RequestContext) {
        if let Some(user_id) = self.user_id {
            context.user_id = Some(user_id);
        }
        if let Some(tenant_id) = self.tenant_id {
            context.tenant_id = Some(tenant_id);
        }
        if let Some(token) = self.token {
            context.token = Some(token);
        }
    }
}
