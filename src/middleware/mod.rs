//! Middleware contract and stock middlewares (SPEC_FULL.md §4.4).

pub mod gzip;
pub mod trace;
pub mod traits;

pub use gzip::GZipMiddleware;
pub use trace::{DistributedTraceContextualizeLogsMiddleware, DistributedTracePropagateMiddleware};
pub use traits::{build_chain, ChainLink, MiddlewareFactory, PublishError};
