//! Router-level errors (SPEC_FULL.md §7, registration-time).

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Registration-time failures raised while composing routers and
/// subscribers. All are fatal per §7 ("Registration-time errors abort the
/// program").
#[derive(Debug, Error)]
pub enum RouterError {
    /// The prefix does not match `^[A-Za-z0-9]([A-Za-z0-9_./]*[A-Za-z0-9])?$`.
    #[error("invalid router prefix: {0:?}")]
    InvalidPrefix(String),

    /// `include_router` was given a router equal to `self` or that already
    /// contains `self` among its descendants.
    #[error("router cannot be included into its own ancestor chain")]
    InvalidRouter,

    /// Two sibling routers under the same parent share a prefix.
    #[error("duplicate child router prefix: {0:?}")]
    DuplicatePrefix(String),

    /// Two subscribers share an alias within the same router (after
    /// prefixing).
    #[error("duplicate subscriber alias: {0:?}")]
    DuplicateAlias(String),
}
