//! The APM provider seam (SPEC_FULL.md §9 "Global APM/logging"), grounded in
//! the teacher's `monitoring::Monitor<E>` trait but scoped to what the poll
//! task and middleware chain actually need: trace/span identity and
//! distributed-trace header propagation. A full metrics/event pipeline is
//! out of core scope (§1) — this is the minimal seam a real provider
//! (New Relic, Datadog, OpenTelemetry) plugs into.

// Layer 1: Standard library imports
use std::collections::HashMap;

/// An open APM transaction. The transaction ends when the scope is dropped;
/// providers with real backends hold whatever state that needs (a span
/// handle, a timer) behind their own type.
pub trait ApmTransaction: Send {}

impl ApmTransaction for () {}

/// A resolved-once-per-process observability dependency. The core only ever
/// calls the methods below; a no-op implementation fully satisfies the
/// contract (§9).
pub trait ApmProvider: Send + Sync {
    /// Opens a background transaction named `name`, returning a scope guard
    /// that ends it on drop (§4.8 "Open an observability context").
    fn background_transaction(&self, name: &str) -> Box<dyn ApmTransaction>;

    /// Returns the current transaction's trace id, if any is active.
    fn get_trace_id(&self) -> Option<String>;

    /// Returns the current transaction's span id, if any is active.
    fn get_span_id(&self) -> Option<String>;

    /// Accepts distributed-trace headers carried on an incoming message,
    /// resuming the upstream trace for the duration of the current
    /// transaction.
    fn set_distributed_trace_context(&self, headers: &HashMap<String, String>);

    /// Returns headers to attach to an outgoing publish so a downstream
    /// consumer can resume this trace (`middleware::trace`).
    fn get_distributed_trace_context(&self) -> HashMap<String, String>;

    /// Whether the provider is active and should be consulted at all; a
    /// no-op provider returns `false` so callers can skip header
    /// round-trips entirely.
    fn active(&self) -> bool {
        true
    }
}
