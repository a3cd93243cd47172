//! The `Publisher` value object and its terminal chain command
//! (SPEC_FULL.md §3, §4.3).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde::Serialize;

// Layer 3: Internal module imports
use crate::broker::BrokerConfig;
use crate::client::{with_timeout, BusClient};
use crate::message::HandlerOutcome;
use crate::message::Message;
use crate::middleware::{build_chain, ChainLink, MiddlewareFactory, PublishError};

/// A payload accepted by `Publisher::publish`, covering the four
/// serializable cases named in §4.3 (the fifth, "anything else", is simply
/// not representable by this enum and is a compile-time error rather than a
/// runtime one — an improvement the typed host language affords over the
/// original's duck-typed `Any`).
#[derive(Debug, Clone)]
pub enum PublishPayload {
    /// Passed through unchanged.
    Bytes(Vec<u8>),
    /// UTF-8 encoded.
    Text(String),
    /// JSON-encoded with no indentation and compact separators.
    Json(serde_json::Value),
}

impl PublishPayload {
    fn into_bytes(self) -> Result<Vec<u8>, PublishError> {
        match self {
            Self::Bytes(b) => Ok(b),
            Self::Text(s) => Ok(s.into_bytes()),
            Self::Json(value) => serde_json::to_vec(&value)
                .map_err(|err| PublishError::BusClient(Box::new(err))),
        }
    }

    /// Builds the JSON case from any `Serialize` type — the "schema-validated
    /// structured object" row of §4.3's serialization table.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, PublishError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|_| PublishError::UnserializablePayload)
    }
}

impl From<Vec<u8>> for PublishPayload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<String> for PublishPayload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for PublishPayload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for PublishPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// The terminal chain node that delegates to the bus client, autocreating
/// the topic first when asked (§4.3 `PublishMessageCommand`).
pub struct PublishMessageCommand {
    topic_name: String,
    autocreate: bool,
    bus_client: Arc<dyn BusClient>,
    config: BrokerConfig,
}

impl PublishMessageCommand {
    pub fn new(
        topic_name: impl Into<String>,
        autocreate: bool,
        bus_client: Arc<dyn BusClient>,
        config: BrokerConfig,
    ) -> Self {
        Self {
            topic_name: topic_name.into(),
            autocreate,
            bus_client,
            config,
        }
    }
}

#[async_trait]
impl ChainLink for PublishMessageCommand {
    async fn on_message(&self, _message: Message) -> Result<(), HandlerOutcome> {
        Err(HandlerOutcome::Failed(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "on_message called on a publish chain terminus",
        ))))
    }

    async fn on_publish(
        &self,
        data: Vec<u8>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        if self.autocreate {
            with_timeout(
                self.config.operation_timeout(),
                self.bus_client.create_topic(&self.topic_name, false),
            )
            .await
            .map_err(|err| PublishError::BusClient(Box::new(err)))?;
        }

        with_timeout(
            self.config.operation_timeout(),
            self.bus_client.publish(&self.topic_name, data, ordering_key, attributes),
        )
        .await
        .map(|_message_id| ())
        .map_err(|err| PublishError::BusClient(Box::new(err)))
    }
}

/// Mutable fields of a `Publisher`, held behind a lock so a `Publisher` can
/// be handed out as `Arc<Publisher>` by `Router::publisher` (memoized,
/// potentially aliased by the caller) while `include_router`'s middleware
/// and project_id cascades can still reach it later. Mirrors the teacher's
/// `Arc<Inner>` + `parking_lot::RwLock` state-holder pattern
/// (`system::actor_system::ActorSystem`).
struct PublisherState {
    project_id: String,
    middlewares: Vec<Arc<dyn MiddlewareFactory>>,
    config: BrokerConfig,
}

/// A per-topic publish handle, memoized one-per-`(router, topic_name)` pair
/// by the owning router (§3 "Publishers are memoized per topic").
pub struct Publisher {
    topic_name: String,
    bus_client: Arc<dyn BusClient>,
    state: parking_lot::RwLock<PublisherState>,
}

impl Publisher {
    pub fn new(
        topic_name: impl Into<String>,
        middlewares: Vec<Arc<dyn MiddlewareFactory>>,
        bus_client: Arc<dyn BusClient>,
    ) -> Self {
        Self {
            topic_name: topic_name.into(),
            bus_client,
            state: parking_lot::RwLock::new(PublisherState {
                project_id: String::new(),
                middlewares,
                config: BrokerConfig::default(),
            }),
        }
    }

    pub fn project_id(&self) -> String {
        self.state.read().project_id.clone()
    }

    pub fn set_project_id(&self, project_id: impl Into<String>) {
        self.state.write().project_id = project_id.into();
    }

    pub fn config(&self) -> BrokerConfig {
        self.state.read().config
    }

    pub fn set_config(&self, config: BrokerConfig) {
        self.state.write().config = config;
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn middlewares(&self) -> Vec<Arc<dyn MiddlewareFactory>> {
        self.state.read().middlewares.clone()
    }

    /// Idempotent, identity-based append (§4.3 `include_middleware`).
    pub fn include_middleware(&self, middleware: Arc<dyn MiddlewareFactory>) {
        let mut state = self.state.write();
        let already_present = state
            .middlewares
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &middleware));
        if !already_present {
            state.middlewares.push(middleware);
        }
    }

    /// Serializes `payload`, builds the publish callstack, and runs it
    /// (§4.3).
    pub async fn publish(
        &self,
        payload: impl Into<PublishPayload>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
        autocreate: bool,
    ) -> Result<(), PublishError> {
        let data = payload.into().into_bytes()?;
        let terminal = Box::new(PublishMessageCommand::new(
            self.topic_name.clone(),
            autocreate,
            self.bus_client.clone(),
            self.config(),
        ));
        let middlewares = self.middlewares();
        let chain = build_chain(&middlewares, terminal);
        chain.on_publish(data, ordering_key, attributes).await
    }
}
