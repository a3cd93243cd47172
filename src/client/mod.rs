//! The abstract bus client (SPEC_FULL.md §6), consumed by the subscription
//! builder and the poll task. Field names mirror
//! `yoshidan_google_cloud_rust::pubsub`'s `SubscriptionConfig`/
//! `ReceivedMessage` so a real implementation is a thin adapter, not a
//! translation layer.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::policy::{DeadLetterPolicy, MessageDeliveryPolicy, MessageRetryPolicy};

/// One message as handed back by a `pull` call, before translation into the
/// core's `Message` (§4.8 "Message translation").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub data: Vec<u8>,
    pub attributes: HashMap<String, String>,
    pub ack_id: String,
    pub delivery_attempt: Option<u32>,
}

/// Failures surfaced by a `BusClient` implementation before the poll task's
/// classifier (§4.8 `_on_exception`) sorts them into retryable vs. fatal.
///
/// Variant names mirror the gRPC status codes the original's
/// `RETRYABLE_GCP_EXCEPTIONS`/`FATAL_GCP_EXCEPTIONS` tuples list, since the
/// classifier matches on exactly these.
#[derive(Debug, Error)]
pub enum BusClientError {
    #[error("aborted: {0}")]
    Aborted(String),
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("unknown bus error: {0}")]
    Unknown(String),
    #[error("cancelled: {0}")]
    Cancelled(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

/// Abstract interface for topic/subscription CRUD, pull, ack, nack, and
/// publish (SPEC_FULL.md §6). The wire client itself — gRPC transport,
/// authentication, retries at the transport layer — is explicitly out of
/// core scope (§1); implementations adapt a real Pub/Sub SDK to this trait.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Creates a topic if absent; succeeds when it already exists.
    async fn create_topic(
        &self,
        topic_name: &str,
        create_default_subscription: bool,
    ) -> Result<(), BusClientError>;

    /// Creates a subscription if absent; succeeds when it already exists.
    async fn create_subscription(
        &self,
        topic_name: &str,
        subscription_name: &str,
        retry_policy: &MessageRetryPolicy,
        delivery_policy: &MessageDeliveryPolicy,
        dead_letter_policy: Option<&DeadLetterPolicy>,
    ) -> Result<(), BusClientError>;

    /// Updates an existing subscription in place. Fails with
    /// `BusClientError::NotFound` if the subscription is absent; the
    /// subscription builder translates that into
    /// `SubscriptionNotProvisioned`.
    async fn update_subscription(
        &self,
        topic_name: &str,
        subscription_name: &str,
        retry_policy: &MessageRetryPolicy,
        delivery_policy: &MessageDeliveryPolicy,
        dead_letter_policy: Option<&DeadLetterPolicy>,
    ) -> Result<(), BusClientError>;

    /// Pulls up to `max_messages` messages from `subscription_name`.
    async fn pull(
        &self,
        subscription_name: &str,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>, BusClientError>;

    /// Acknowledges the given ack tokens.
    async fn ack(&self, ack_tokens: &[String], subscription_name: &str)
        -> Result<(), BusClientError>;

    /// Negatively acknowledges the given ack tokens (implemented by the
    /// real bus as "set ack-deadline to 0").
    async fn nack(
        &self,
        ack_tokens: &[String],
        subscription_name: &str,
    ) -> Result<(), BusClientError>;

    /// Publishes one message, returning the bus-assigned message id.
    async fn publish(
        &self,
        topic_name: &str,
        data: Vec<u8>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
    ) -> Result<String, BusClientError>;
}

/// Runs `future` under `timeout`, surfacing an elapsed deadline as
/// `BusClientError::DeadlineExceeded` so it folds into the same retry
/// classification as a bus-reported deadline (SPEC_FULL.md §9 "Every bus
/// call carries a fixed operation timeout").
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, BusClientError>
where
    F: std::future::Future<Output = Result<T, BusClientError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(BusClientError::DeadlineExceeded(format!(
            "operation exceeded {timeout:?} timeout"
        ))),
    }
}
