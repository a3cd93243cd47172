//! The subscription builder (SPEC_FULL.md §4.5): idempotently reconciles
//! declared subscribers against the bus.

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use crate::broker::BrokerConfig;
use crate::client::{with_timeout, BusClient};
use crate::error::FastPubSubError;
use crate::subscriber::Subscriber;

/// Reconciles one subscriber's topic/subscription state against the bus,
/// deduplicating topic creation within one startup cycle (§4.5).
pub struct SubscriptionBuilder {
    bus_client: Arc<dyn BusClient>,
    emulator_mode: bool,
    config: BrokerConfig,
    created_topics: Mutex<HashSet<String>>,
}

impl SubscriptionBuilder {
    pub fn new(bus_client: Arc<dyn BusClient>, emulator_mode: bool, config: BrokerConfig) -> Self {
        Self {
            bus_client,
            emulator_mode,
            config,
            created_topics: Mutex::new(HashSet::new()),
        }
    }

    /// `true` when `PUBSUB_EMULATOR_HOST` is set, per §4.5's "omit `filter`
    /// from update masks when running against an emulator".
    pub fn detect_emulator_mode() -> bool {
        std::env::var_os("PUBSUB_EMULATOR_HOST").is_some()
    }

    async fn create_topic_once(&self, topic_name: &str, create_default_subscription: bool) -> Result<(), FastPubSubError> {
        {
            let mut created = self.created_topics.lock();
            if created.contains(topic_name) {
                return Ok(());
            }
            created.insert(topic_name.to_string());
        }

        with_timeout(
            self.config.operation_timeout(),
            self.bus_client.create_topic(topic_name, create_default_subscription),
        )
        .await
        .map_err(|err| FastPubSubError::BusClient(Box::new(err)))
    }

    /// Reconciles `subscriber`'s topic/subscription state (§4.5 `build`).
    pub async fn build(&self, subscriber: &Subscriber) -> Result<(), FastPubSubError> {
        let lifecycle = subscriber.lifecycle_policy();

        if lifecycle.autocreate() {
            self.create_topic_once(subscriber.topic_name(), false).await?;

            if let Some(dead_letter) = subscriber.dead_letter_policy() {
                self.create_topic_once(dead_letter.topic_name(), true).await?;
            }

            with_timeout(
                self.config.operation_timeout(),
                self.bus_client.create_subscription(
                    subscriber.topic_name(),
                    subscriber.subscription_name(),
                    subscriber.retry_policy(),
                    subscriber.delivery_policy(),
                    subscriber.dead_letter_policy(),
                ),
            )
            .await
            .map_err(|err| FastPubSubError::BusClient(Box::new(err)))?;
        }

        if lifecycle.autoupdate() {
            // Update mask is implicit in the bus client trait: it always
            // updates ack_deadline_seconds, dead_letter_policy, retry_policy,
            // and enable_exactly_once_delivery. `filter` is included only
            // when not running against an emulator; we model that by
            // zeroing the filter on the delivery policy we hand over rather
            // than by threading a mask through the trait, since the
            // `BusClient` contract (§6) does not expose a mask parameter.
            let delivery_policy = if self.emulator_mode && subscriber.delivery_policy().has_filter() {
                crate::policy::MessageDeliveryPolicy::new(
                    "",
                    subscriber.delivery_policy().ack_deadline_seconds(),
                    subscriber.delivery_policy().enable_message_ordering(),
                    subscriber.delivery_policy().enable_exactly_once_delivery(),
                )
            } else {
                subscriber.delivery_policy().clone()
            };

            with_timeout(
                self.config.operation_timeout(),
                self.bus_client.update_subscription(
                    subscriber.topic_name(),
                    subscriber.subscription_name(),
                    subscriber.retry_policy(),
                    &delivery_policy,
                    subscriber.dead_letter_policy(),
                ),
            )
            .await
            .map_err(|err| match err {
                crate::client::BusClientError::NotFound(_) => {
                    FastPubSubError::SubscriptionNotProvisioned(
                        subscriber.subscription_name().to_string(),
                    )
                }
                other => FastPubSubError::BusClient(Box::new(other)),
            })?;
        }

        Ok(())
    }
}
