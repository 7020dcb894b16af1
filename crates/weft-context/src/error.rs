use thiserror::Error;

/// Read or mutate was attempted with no active binding.
///
/// Both variants signal the same underlying condition; the variant is the
/// reason discriminator, the message text differs so callers can tell a
/// failed lookup from a failed update in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextMissing {
    #[error("{name} not found. This usually means the context middleware was not properly applied.")]
    NotFound { name: String },

    #[error("Cannot update context outside of a {name}")]
    UpdateWithoutScope { name: String },
}

impl ContextMissing {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    // The update message names the storage in running text, so it carries
    // the lower-cased diagnostic name.
    pub(crate) fn update_without_scope(name: &str) -> Self {
        Self::UpdateWithoutScope { name: name.to_lowercase() }
    }
}
