//! The top-level error enum (SPEC_FULL.md §7), one variant per row of the
//! error table plus a passthrough for the abstract bus client's own
//! failures before classification.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Fatal, registration- or start-time failures, and the passthrough for bus
/// errors that have not yet reached the poll task's classifier.
///
/// `HandlerOutcome` (see `crate::message`) is deliberately not a variant
/// here: it never escapes `_consume`, so it is not part of this table.
#[derive(Debug, Error)]
pub enum FastPubSubError {
    /// `project_id` was empty at broker construction.
    #[error("project_id must be a non-empty, trimmed string")]
    InvalidProjectId,

    /// A router prefix failed `^[A-Za-z0-9]([A-Za-z0-9_./]*[A-Za-z0-9])?$`.
    #[error("invalid router prefix: {0:?}")]
    InvalidPrefix(String),

    /// `include_router` was given a router equal to `self` or one that
    /// already contains `self` among its descendants.
    #[error("router cannot be included into its own ancestor chain")]
    InvalidRouter,

    /// Two sibling routers share a prefix.
    #[error("duplicate child router prefix: {0:?}")]
    DuplicatePrefix(String),

    /// Two subscribers share an alias within the same router.
    #[error("duplicate subscriber alias: {0:?}")]
    DuplicateAlias(String),

    /// A publisher could not serialize the given payload.
    #[error("payload is not serializable to bytes, str, or a JSON-compatible mapping")]
    UnserializablePayload,

    /// The subscriber selection filter (`FASTPUBSUB_SUBSCRIBERS`) left an
    /// empty set.
    #[error("no subscribers selected to start")]
    NoSubscribersSelected,

    /// `update_subscription` was called against a subscription the bus
    /// does not know about.
    #[error("subscription {0:?} is not provisioned; enable autocreate or create it out of band")]
    SubscriptionNotProvisioned(String),

    /// Wraps a bus client failure that has not yet been classified as
    /// retryable or fatal (§4.8 `_on_exception`).
    #[error("bus client error: {0}")]
    BusClient(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::router::RouterError> for FastPubSubError {
    fn from(err: crate::router::RouterError) -> Self {
        match err {
            crate::router::RouterError::InvalidPrefix(prefix) => Self::InvalidPrefix(prefix),
            crate::router::RouterError::InvalidRouter => Self::InvalidRouter,
            crate::router::RouterError::DuplicatePrefix(prefix) => Self::DuplicatePrefix(prefix),
            crate::router::RouterError::DuplicateAlias(alias) => Self::DuplicateAlias(alias),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_error_converts_with_message_preserved() {
        let err: FastPubSubError = crate::router::RouterError::DuplicateAlias("foo".into()).into();
        assert!(matches!(err, FastPubSubError::DuplicateAlias(alias) if alias == "foo"));
    }
}
