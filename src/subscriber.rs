//! The `Subscriber` value object and its terminal chain command
//! (SPEC_FULL.md §3, §4.2).

// Layer 1: Standard library imports
use std::future::Future;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::middleware::{build_chain, ChainLink, MiddlewareFactory, PublishError};
use crate::message::{HandlerOutcome, Message};
use crate::policy::{
    DeadLetterPolicy, LifecyclePolicy, MessageControlFlowPolicy, MessageDeliveryPolicy,
    MessageRetryPolicy,
};

/// A user-supplied message handler (§6 "Handler contract"): a single-argument
/// async callable whose return value signals the acknowledgement outcome.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<(), HandlerOutcome>;
}

/// Blanket impl so any `Fn(Message) -> impl Future<Output = Result<(),
/// HandlerOutcome>>` closure can be registered directly without a wrapper
/// type, matching how the original decorates a bare async function.
#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerOutcome>> + Send,
{
    async fn handle(&self, message: Message) -> Result<(), HandlerOutcome> {
        (self)(message).await
    }
}

/// The terminal chain node that invokes the bound handler (§4.2
/// `build_callstack`, §9 "terminal nodes... implement the same interface and
/// are the chain tail").
pub struct HandleMessageCommand {
    handler: Arc<dyn Handler>,
}

impl HandleMessageCommand {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl ChainLink for HandleMessageCommand {
    async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
        self.handler.handle(message).await
    }

    async fn on_publish(
        &self,
        _data: Vec<u8>,
        _ordering_key: Option<String>,
        _attributes: std::collections::HashMap<String, String>,
    ) -> Result<(), PublishError> {
        Err(PublishError::BusClient(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "on_publish called on a message-handling chain terminus",
        ))))
    }
}

/// A per-subscription registration: handler, policies, and the middleware
/// list that will be composed into a callstack at dispatch time
/// (SPEC_FULL.md §3). `Clone` is cheap: every field is a `String`, a `Copy`
/// policy struct, or an `Arc`.
#[derive(Clone)]
pub struct Subscriber {
    name: String,
    project_id: String,
    topic_name: String,
    subscription_name: String,
    retry_policy: MessageRetryPolicy,
    delivery_policy: MessageDeliveryPolicy,
    dead_letter_policy: Option<DeadLetterPolicy>,
    lifecycle_policy: LifecyclePolicy,
    control_flow_policy: MessageControlFlowPolicy,
    middlewares: Vec<Arc<dyn MiddlewareFactory>>,
    handler: Arc<dyn Handler>,
}

impl Subscriber {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        topic_name: impl Into<String>,
        subscription_name: impl Into<String>,
        handler: Arc<dyn Handler>,
        retry_policy: MessageRetryPolicy,
        delivery_policy: MessageDeliveryPolicy,
        dead_letter_policy: Option<DeadLetterPolicy>,
        lifecycle_policy: LifecyclePolicy,
        control_flow_policy: MessageControlFlowPolicy,
        middlewares: Vec<Arc<dyn MiddlewareFactory>>,
    ) -> Self {
        Self {
            name: name.into(),
            project_id: String::new(),
            topic_name: topic_name.into(),
            subscription_name: subscription_name.into(),
            retry_policy,
            delivery_policy,
            dead_letter_policy,
            lifecycle_policy,
            control_flow_policy,
            middlewares,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn set_project_id(&mut self, project_id: impl Into<String>) {
        self.project_id = project_id.into();
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn subscription_name(&self) -> &str {
        &self.subscription_name
    }

    pub fn set_subscription_name(&mut self, subscription_name: impl Into<String>) {
        self.subscription_name = subscription_name.into();
    }

    pub fn retry_policy(&self) -> &MessageRetryPolicy {
        &self.retry_policy
    }

    pub fn delivery_policy(&self) -> &MessageDeliveryPolicy {
        &self.delivery_policy
    }

    pub fn dead_letter_policy(&self) -> Option<&DeadLetterPolicy> {
        self.dead_letter_policy.as_ref()
    }

    pub fn lifecycle_policy(&self) -> &LifecyclePolicy {
        &self.lifecycle_policy
    }

    pub fn control_flow_policy(&self) -> &MessageControlFlowPolicy {
        &self.control_flow_policy
    }

    pub fn middlewares(&self) -> &[Arc<dyn MiddlewareFactory>] {
        &self.middlewares
    }

    /// Idempotent, identity-based append (§4.2 `include_middleware`).
    pub fn include_middleware(&mut self, middleware: Arc<dyn MiddlewareFactory>) {
        let already_present = self
            .middlewares
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &middleware));
        if !already_present {
            self.middlewares.push(middleware);
        }
    }

    /// Builds the full on-message callstack (§4.2 `build_callstack`).
    pub fn build_callstack(&self) -> Box<dyn ChainLink> {
        let terminal = Box::new(HandleMessageCommand::new(self.handler.clone()));
        build_chain(&self.middlewares, terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn sample_subscriber(middlewares: Vec<Arc<dyn MiddlewareFactory>>) -> Subscriber {
        Subscriber::new(
            "ingest",
            "topic",
            "sub",
            Arc::new(|_msg: Message| async { Ok(()) }),
            MessageRetryPolicy::default(),
            MessageDeliveryPolicy::default(),
            None,
            LifecyclePolicy::default(),
            MessageControlFlowPolicy::default(),
            middlewares,
        )
    }

    #[tokio::test]
    async fn build_callstack_invokes_handler() {
        let calls = Arc::new(Mutex::new(0));
        let calls_clone = calls.clone();
        let handler: Arc<dyn Handler> = Arc::new(move |_msg: Message| {
            let calls = calls_clone.clone();
            async move {
                *calls.lock().unwrap() += 1;
                Ok(())
            }
        });

        let subscriber = Subscriber::new(
            "ingest",
            "topic",
            "sub",
            handler,
            MessageRetryPolicy::default(),
            MessageDeliveryPolicy::default(),
            None,
            LifecyclePolicy::default(),
            MessageControlFlowPolicy::default(),
            vec![],
        );

        let chain = subscriber.build_callstack();
        chain
            .on_message(Message::new("m", vec![], HashMap::new(), "ack", 0))
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn include_middleware_is_idempotent() {
        struct Noop;
        impl MiddlewareFactory for Noop {
            fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink> {
                next
            }
        }

        let mut subscriber = sample_subscriber(vec![]);
        let mw: Arc<dyn MiddlewareFactory> = Arc::new(Noop);

        subscriber.include_middleware(mw.clone());
        subscriber.include_middleware(mw.clone());

        assert_eq!(subscriber.middlewares().len(), 1);
    }
}
