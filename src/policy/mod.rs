//! Immutable policy records attached to subscribers and publishers.
//!
//! Every record here is a plain value type: constructed once at registration
//! time, never mutated, freely `Clone`. They carry no behavior of their own —
//! the router, builder, and poll task read them to decide what to ask the bus
//! client for.

pub mod control_flow;
pub mod dead_letter;
pub mod delivery;
pub mod lifecycle;
pub mod retry;

pub use control_flow::MessageControlFlowPolicy;
pub use dead_letter::DeadLetterPolicy;
pub use delivery::MessageDeliveryPolicy;
pub use lifecycle::LifecyclePolicy;
pub use retry::MessageRetryPolicy;
