//! # fastpubsub - a message-consumption framework for a Pub/Sub bus
//!
//! Declarative subscriber/publisher registration, hierarchical routers with
//! prefix and middleware inheritance, idempotent topic/subscription
//! reconciliation, and a concurrent pull-dispatch-ack runtime — all on top
//! of an abstract `BusClient` so the wire client can be swapped for a real
//! Pub/Sub SDK, an emulator, or a test double.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use fastpubsub::broker::{Broker, BrokerConfig};
//! use fastpubsub::policy::*;
//! use std::sync::Arc;
//!
//! # async fn run(bus_client: Arc<dyn fastpubsub::client::BusClient>) -> Result<(), fastpubsub::error::FastPubSubError> {
//! let mut broker = Broker::new("my-project", bus_client, BrokerConfig::default())?;
//!
//! broker.router_mut().subscriber(
//!     "ingest",
//!     "orders.created",
//!     "orders-ingest",
//!     Arc::new(|message: fastpubsub::message::Message| async move {
//!         println!("got {} bytes", message.size());
//!         Ok(())
//!     }),
//!     MessageRetryPolicy::default(),
//!     MessageDeliveryPolicy::default(),
//!     None,
//!     LifecyclePolicy::default(),
//!     MessageControlFlowPolicy::default(),
//!     vec![],
//! )?;
//!
//! broker.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod builder;
pub mod client;
pub mod error;
pub mod message;
pub mod middleware;
pub mod observability;
pub mod policy;
pub mod publisher;
pub mod router;
pub mod shell;
pub mod subscriber;
pub mod task;
pub mod util;

pub use broker::{Broker, BrokerConfig, BrokerConfigBuilder};
pub use client::{BusClient, BusClientError, ReceivedMessage};
pub use error::FastPubSubError;
pub use message::{HandlerOutcome, Message};
pub use publisher::{Publisher, PublishPayload};
pub use router::{Router, RouterError};
pub use shell::AppShell;
pub use subscriber::{Handler, Subscriber};
