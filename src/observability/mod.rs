//! The observability seam the core calls into (SPEC_FULL.md §9, §9a).

pub mod noop;
pub mod traits;

pub use noop::NoopApmProvider;
pub use traits::{ApmProvider, ApmTransaction};
