//! Bus error classification (SPEC_FULL.md §4.8 `_on_exception`).

// Layer 3: Internal module imports
use crate::client::BusClientError;

/// What a poll task should do after a bus call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Leave `running` true, set `ready` false, log a warning.
    Retryable,
    /// Set `running` false, set `ready` false, log as an error.
    Fatal,
}

/// Sorts a `BusClientError` into the retryable or fatal set named in §4.8.
/// Unknown/unmatched variants default to retryable, per the spec's
/// "anything else → treat as retryable with a warning" fallback.
pub fn classify(error: &BusClientError) -> Classification {
    match error {
        BusClientError::Aborted(_)
        | BusClientError::DeadlineExceeded(_)
        | BusClientError::GatewayTimeout(_)
        | BusClientError::InternalServerError(_)
        | BusClientError::ResourceExhausted(_)
        | BusClientError::ServiceUnavailable(_)
        | BusClientError::Unknown(_) => Classification::Retryable,

        BusClientError::Cancelled(_)
        | BusClientError::InvalidArgument(_)
        | BusClientError::NotFound(_)
        | BusClientError::PermissionDenied(_)
        | BusClientError::Unauthenticated(_)
        | BusClientError::Unauthorized(_) => Classification::Fatal,
    }
}
