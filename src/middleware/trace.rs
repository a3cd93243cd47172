//! Distributed-trace middlewares (SPEC_FULL.md §4.4, supplemented from
//! `original_source/fastpubsub/middlewares/apm.py`'s
//! `DistributedTracePropagateMiddleware` and
//! `DistributedTraceContextualizeLogsMiddleware`).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use tracing::Instrument;

// Layer 3: Internal module imports
use super::traits::{ChainLink, MiddlewareFactory, PublishError};
use crate::message::{HandlerOutcome, Message};
use crate::observability::ApmProvider;

/// On publish, stamps the active trace's propagation headers onto the
/// outgoing attributes; on message, hands any such headers found on the
/// incoming attributes back to the provider so it can resume the trace.
pub struct DistributedTracePropagateMiddleware {
    provider: Arc<dyn ApmProvider>,
}

impl DistributedTracePropagateMiddleware {
    pub fn new(provider: Arc<dyn ApmProvider>) -> Self {
        Self { provider }
    }
}

impl MiddlewareFactory for DistributedTracePropagateMiddleware {
    fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink> {
        Box::new(TracePropagateLink {
            provider: self.provider.clone(),
            next,
        })
    }
}

struct TracePropagateLink {
    provider: Arc<dyn ApmProvider>,
    next: Box<dyn ChainLink>,
}

#[async_trait]
impl ChainLink for TracePropagateLink {
    async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
        if self.provider.active() {
            self.provider.set_distributed_trace_context(message.attributes());
        }
        self.next.on_message(message).await
    }

    async fn on_publish(
        &self,
        data: Vec<u8>,
        ordering_key: Option<String>,
        mut attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        if self.provider.active() {
            attributes.extend(self.provider.get_distributed_trace_context());
        }
        self.next.on_publish(data, ordering_key, attributes).await
    }
}

/// On message, wraps the inner call in a `tracing` span carrying the
/// active trace/span ids, so every log line emitted further down the chain
/// (including by the user handler) inherits them without threading context
/// through the handler's own signature. Grounded on the original's
/// `logger.contextualize(trace_id=..., span_id=...)` pattern, reworked as
/// the idiomatic `tracing::Span::in_scope`/`Instrument` mechanism.
pub struct DistributedTraceContextualizeLogsMiddleware {
    provider: Arc<dyn ApmProvider>,
}

impl DistributedTraceContextualizeLogsMiddleware {
    pub fn new(provider: Arc<dyn ApmProvider>) -> Self {
        Self { provider }
    }
}

impl MiddlewareFactory for DistributedTraceContextualizeLogsMiddleware {
    fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink> {
        Box::new(ContextualizeLogsLink {
            provider: self.provider.clone(),
            next,
        })
    }
}

struct ContextualizeLogsLink {
    provider: Arc<dyn ApmProvider>,
    next: Box<dyn ChainLink>,
}

#[async_trait]
impl ChainLink for ContextualizeLogsLink {
    async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
        let span = tracing::info_span!(
            "message_context",
            trace_id = self.provider.get_trace_id().unwrap_or_default(),
            span_id = self.provider.get_span_id().unwrap_or_default(),
        );
        self.next.on_message(message).instrument(span).await
    }

    async fn on_publish(
        &self,
        data: Vec<u8>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        let span = tracing::info_span!(
            "publish_context",
            trace_id = self.provider.get_trace_id().unwrap_or_default(),
            span_id = self.provider.get_span_id().unwrap_or_default(),
        );
        self.next
            .on_publish(data, ordering_key, attributes)
            .instrument(span)
            .await
    }
}
