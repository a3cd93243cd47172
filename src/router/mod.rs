//! The `Router` composition tree (SPEC_FULL.md §3, §4.1): prefix
//! propagation, middleware inheritance, project-id propagation, alias
//! uniqueness.

pub mod error;

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use uuid::Uuid;

// Layer 3: Internal module imports
use crate::broker::BrokerConfig;
use crate::client::BusClient;
use crate::middleware::{MiddlewareFactory, PublishError};
use crate::publisher::{Publisher, PublishPayload};
use crate::subscriber::{Handler, Subscriber};
use crate::util::{is_valid_prefix, join_prefix};

pub use error::RouterError;

/// A tree node owning subscribers, publishers, child routers, and
/// middleware. Constructed at registration time, mutated only by the
/// composition operations below, and frozen once a broker starts (§3
/// "Lifecycle").
pub struct Router {
    id: Uuid,
    prefix: String,
    project_id: String,
    config: BrokerConfig,
    bus_client: Arc<dyn BusClient>,
    children: Vec<Router>,
    publishers: HashMap<String, Arc<Publisher>>,
    subscribers: HashMap<String, Subscriber>,
    middlewares: Vec<Arc<dyn MiddlewareFactory>>,
}

#[allow(clippy::too_many_arguments)]
impl Router {
    /// Builds an empty router rooted at `prefix`. `bus_client` is the
    /// abstract bus dependency every publisher created under this router
    /// delegates to (an implementation decision not fixed by §3's data
    /// model, recorded in DESIGN.md).
    pub fn new(prefix: impl Into<String>, bus_client: Arc<dyn BusClient>) -> Result<Self, RouterError> {
        let prefix = prefix.into();
        if !is_valid_prefix(&prefix) {
            return Err(RouterError::InvalidPrefix(prefix));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            prefix,
            project_id: String::new(),
            config: BrokerConfig::default(),
            bus_client,
            children: Vec::new(),
            publishers: HashMap::new(),
            subscribers: HashMap::new(),
            middlewares: Vec::new(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn middlewares(&self) -> &[Arc<dyn MiddlewareFactory>] {
        &self.middlewares
    }

    /// Registers a subscriber (§4.1 `subscriber`). Prefixes `alias` and
    /// `subscription_name` with `self.prefix`; fails with `DuplicateAlias`
    /// if the resulting alias is already taken. The subscriber's middleware
    /// list is `[user-provided middlewares…, router.middlewares…]` (order
    /// preserved), so it resolves to "its own declared middlewares first,
    /// the router's after" once further composed (§8 invariant 4).
    #[allow(clippy::too_many_arguments)]
    pub fn subscriber(
        &mut self,
        alias: impl Into<String>,
        topic_name: impl Into<String>,
        subscription_name: impl Into<String>,
        handler: Arc<dyn Handler>,
        retry_policy: crate::policy::MessageRetryPolicy,
        delivery_policy: crate::policy::MessageDeliveryPolicy,
        dead_letter_policy: Option<crate::policy::DeadLetterPolicy>,
        lifecycle_policy: crate::policy::LifecyclePolicy,
        control_flow_policy: crate::policy::MessageControlFlowPolicy,
        mut middlewares: Vec<Arc<dyn MiddlewareFactory>>,
    ) -> Result<(), RouterError> {
        let prefixed_alias = join_prefix(&self.prefix, &alias.into()).to_lowercase();
        if self.subscribers.contains_key(&prefixed_alias) {
            return Err(RouterError::DuplicateAlias(prefixed_alias));
        }

        let prefixed_subscription_name = join_prefix(&self.prefix, &subscription_name.into());

        middlewares.extend(self.middlewares.iter().cloned());

        let mut subscriber = Subscriber::new(
            prefixed_alias.clone(),
            topic_name,
            prefixed_subscription_name,
            handler,
            retry_policy,
            delivery_policy,
            dead_letter_policy,
            lifecycle_policy,
            control_flow_policy,
            middlewares,
        );
        subscriber.set_project_id(self.project_id.clone());

        self.subscribers.insert(prefixed_alias, subscriber);
        Ok(())
    }

    /// Returns the memoized publisher for `topic_name`, constructing one
    /// seeded with `self.middlewares` if absent (§4.1 `publisher`).
    pub fn publisher(&mut self, topic_name: impl Into<String>) -> Arc<Publisher> {
        let topic_name = topic_name.into();
        if let Some(existing) = self.publishers.get(&topic_name) {
            return existing.clone();
        }

        let publisher = Arc::new(Publisher::new(
            topic_name.clone(),
            self.middlewares.clone(),
            self.bus_client.clone(),
        ));
        publisher.set_project_id(self.project_id.clone());
        publisher.set_config(self.config);
        self.publishers.insert(topic_name, publisher.clone());
        publisher
    }

    /// Resolves the publisher for `topic_name` and delegates (§4.1
    /// `publish`).
    pub async fn publish(
        &mut self,
        topic_name: impl Into<String>,
        payload: impl Into<PublishPayload>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
        autocreate: bool,
    ) -> Result<(), PublishError> {
        let publisher = self.publisher(topic_name);
        publisher.publish(payload, ordering_key, attributes, autocreate).await
    }

    /// Attaches `child` under `self` (§4.1 `include_router`).
    pub fn include_router(&mut self, mut child: Router) -> Result<(), RouterError> {
        if child.id == self.id || child.descendant_ids().contains(&self.id) {
            return Err(RouterError::InvalidRouter);
        }
        if self.children.iter().any(|existing| existing.prefix == child.prefix) {
            return Err(RouterError::DuplicatePrefix(child.prefix.clone()));
        }

        child.add_prefix(&self.prefix);
        child.propagate_project_id(&self.project_id);
        child.propagate_config(self.config);
        for middleware in self.middlewares.clone() {
            child.include_middleware(middleware);
        }

        self.children.push(child);
        Ok(())
    }

    /// Idempotent append, cascading into every owned publisher, subscriber,
    /// and child router (§4.1 `include_middleware`).
    pub fn include_middleware(&mut self, middleware: Arc<dyn MiddlewareFactory>) {
        let already_present = self
            .middlewares
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &middleware));
        if !already_present {
            self.middlewares.push(middleware.clone());
        }

        for publisher in self.publishers.values() {
            publisher.include_middleware(middleware.clone());
        }
        for subscriber in self.subscribers.values_mut() {
            subscriber.include_middleware(middleware.clone());
        }
        for child in &mut self.children {
            child.include_middleware(middleware.clone());
        }
    }

    /// Depth-first union of `self.subscribers` and every descendant's,
    /// keyed by the (already-prefixed) alias (§4.1 `_get_subscribers`).
    /// Returns owned, `Arc`-wrapped subscribers so the task manager can
    /// share them with poll tasks without borrowing from the router.
    pub fn get_subscribers(&self) -> HashMap<String, Arc<Subscriber>> {
        let mut all = HashMap::new();
        for (alias, subscriber) in &self.subscribers {
            all.insert(alias.clone(), Arc::new(subscriber.clone()));
        }
        for child in &self.children {
            all.extend(child.get_subscribers());
        }
        all
    }

    /// Sets `self.project_id`, then descends into every child router
    /// (joining the child's own prefix first) and every owned publisher and
    /// subscriber (§4.1 `_propagate_project_id`).
    pub fn propagate_project_id(&mut self, project_id: &str) {
        self.project_id = project_id.to_string();
        for subscriber in self.subscribers.values_mut() {
            subscriber.set_project_id(project_id);
        }
        for publisher in self.publishers.values() {
            publisher.set_project_id(project_id);
        }
        for child in &mut self.children {
            child.propagate_project_id(project_id);
        }
    }

    /// Sets `self.config`, then cascades it into every owned publisher and
    /// child router (mirrors `propagate_project_id`; process-wide operation
    /// tunables, not part of §3's per-subscriber data model).
    pub fn propagate_config(&mut self, config: BrokerConfig) {
        self.config = config;
        for publisher in self.publishers.values() {
            publisher.set_config(config);
        }
        for child in &mut self.children {
            child.propagate_config(config);
        }
    }

    /// Prepends `parent_prefix` to `self.prefix`, cascading the rename to
    /// every descendant subscriber's alias and `subscription_name` (§3
    /// "the rename cascades to every descendant subscriber's alias and
    /// subscription_name"; §9 "Prefix dedupe during propagation").
    fn add_prefix(&mut self, parent_prefix: &str) {
        if parent_prefix.is_empty() {
            return;
        }

        let old_subscribers = std::mem::take(&mut self.subscribers);
        for (old_alias, mut subscriber) in old_subscribers {
            let new_alias = join_prefix(parent_prefix, &old_alias);
            let new_subscription_name = join_prefix(parent_prefix, subscriber.subscription_name());
            subscriber.set_subscription_name(new_subscription_name);
            self.subscribers.insert(new_alias, subscriber);
        }

        for child in &mut self.children {
            child.add_prefix(parent_prefix);
        }

        self.prefix = join_prefix(parent_prefix, &self.prefix);
    }

    fn descendant_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for child in &self.children {
            ids.push(child.id);
            ids.extend(child.descendant_ids());
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BusClientError, ReceivedMessage};
    use crate::message::Message;
    use crate::policy::{
        DeadLetterPolicy, LifecyclePolicy, MessageControlFlowPolicy, MessageDeliveryPolicy,
        MessageRetryPolicy,
    };
    use async_trait::async_trait;

    struct NoopBusClient;

    #[async_trait]
    impl BusClient for NoopBusClient {
        async fn create_topic(&self, _: &str, _: bool) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn create_subscription(
            &self,
            _: &str,
            _: &str,
            _: &MessageRetryPolicy,
            _: &MessageDeliveryPolicy,
            _: Option<&DeadLetterPolicy>,
        ) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn update_subscription(
            &self,
            _: &str,
            _: &str,
            _: &MessageRetryPolicy,
            _: &MessageDeliveryPolicy,
            _: Option<&DeadLetterPolicy>,
        ) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn pull(&self, _: &str, _: u32) -> Result<Vec<ReceivedMessage>, BusClientError> {
            Ok(vec![])
        }
        async fn ack(&self, _: &[String], _: &str) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn nack(&self, _: &[String], _: &str) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn publish(
            &self,
            _: &str,
            _: Vec<u8>,
            _: Option<String>,
            _: HashMap<String, String>,
        ) -> Result<String, BusClientError> {
            Ok("mid".to_string())
        }
    }

    fn noop_handler() -> Arc<dyn Handler> {
        Arc::new(|_msg: Message| async { Ok(()) })
    }

    fn register_subscriber(router: &mut Router, alias: &str) {
        router
            .subscriber(
                alias,
                "topic",
                "stream",
                noop_handler(),
                MessageRetryPolicy::default(),
                MessageDeliveryPolicy::default(),
                None,
                LifecyclePolicy::default(),
                MessageControlFlowPolicy::default(),
                vec![],
            )
            .unwrap();
    }

    #[test]
    fn s1_prefix_propagation() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut child = Router::new("data", bus.clone()).unwrap();
        register_subscriber(&mut child, "ingest");

        let mut parent = Router::new("core", bus).unwrap();
        parent.include_router(child).unwrap();

        let subscribers = parent.get_subscribers();
        let subscriber = subscribers.get("core.data.ingest").expect("expected prefixed alias");
        assert_eq!(subscriber.subscription_name(), "core.data.stream");
    }

    #[test]
    fn s3_duplicate_alias_same_router_rejected() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut router = Router::new("", bus).unwrap();
        register_subscriber(&mut router, "foo");

        let err = router
            .subscriber(
                "foo",
                "topic",
                "stream",
                noop_handler(),
                MessageRetryPolicy::default(),
                MessageDeliveryPolicy::default(),
                None,
                LifecyclePolicy::default(),
                MessageControlFlowPolicy::default(),
                vec![],
            )
            .unwrap_err();

        assert!(matches!(err, RouterError::DuplicateAlias(alias) if alias == "foo"));
    }

    #[test]
    fn s3_duplicate_alias_across_parent_and_child_is_allowed() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut child = Router::new("data", bus.clone()).unwrap();
        register_subscriber(&mut child, "foo");

        let mut parent = Router::new("core", bus).unwrap();
        register_subscriber(&mut parent, "foo");
        parent.include_router(child).unwrap();

        let subscribers = parent.get_subscribers();
        assert!(subscribers.contains_key("core.foo"));
        assert!(subscribers.contains_key("core.data.foo"));
    }

    #[test]
    fn project_id_propagates_to_descendants() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut child = Router::new("data", bus.clone()).unwrap();
        register_subscriber(&mut child, "ingest");

        let mut parent = Router::new("core", bus).unwrap();
        parent.propagate_project_id("proj-1");
        parent.include_router(child).unwrap();

        let subscribers = parent.get_subscribers();
        let subscriber = subscribers.get("core.data.ingest").unwrap();
        assert_eq!(subscriber.project_id(), "proj-1");
    }

    #[test]
    fn sibling_prefix_collision_rejected() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut parent = Router::new("core", bus.clone()).unwrap();
        parent.include_router(Router::new("data", bus.clone()).unwrap()).unwrap();

        let err = parent
            .include_router(Router::new("data", bus).unwrap())
            .unwrap_err();
        assert!(matches!(err, RouterError::DuplicatePrefix(p) if p == "data"));
    }

    #[test]
    fn invalid_prefix_rejected_at_construction() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        assert!(Router::new(".bad", bus).is_err());
    }

    #[test]
    fn publisher_is_memoized_per_topic() {
        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let mut router = Router::new("core", bus).unwrap();

        let first = router.publisher("topic-a");
        let second = router.publisher("topic-a");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn s2_middleware_order() {
        struct TaggedMw(&'static str);
        impl MiddlewareFactory for TaggedMw {
            fn wrap(&self, next: Box<dyn crate::middleware::ChainLink>) -> Box<dyn crate::middleware::ChainLink> {
                next
            }
        }

        let bus: Arc<dyn BusClient> = Arc::new(NoopBusClient);
        let broker_mw: Arc<dyn MiddlewareFactory> = Arc::new(TaggedMw("B"));
        let parent_mw: Arc<dyn MiddlewareFactory> = Arc::new(TaggedMw("P"));
        let child_mw: Arc<dyn MiddlewareFactory> = Arc::new(TaggedMw("C"));
        let user_mw: Arc<dyn MiddlewareFactory> = Arc::new(TaggedMw("U"));

        let mut child = Router::new("data", bus.clone()).unwrap();
        child.include_middleware(child_mw);
        child
            .subscriber(
                "ingest",
                "topic",
                "stream",
                noop_handler(),
                MessageRetryPolicy::default(),
                MessageDeliveryPolicy::default(),
                None,
                LifecyclePolicy::default(),
                MessageControlFlowPolicy::default(),
                vec![user_mw],
            )
            .unwrap();

        let mut parent = Router::new("core", bus).unwrap();
        parent.include_middleware(parent_mw);
        parent.include_router(child).unwrap();
        parent.include_middleware(broker_mw);

        let subscribers = parent.get_subscribers();
        let subscriber = subscribers.get("core.data.ingest").unwrap();

        // [U, C, P, B] per §8 S2.
        assert_eq!(subscriber.middlewares().len(), 4);
    }
}
