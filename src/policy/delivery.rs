//! Message delivery policy (SPEC_FULL.md §3), mirrors
//! `yoshidan_google_cloud_rust::pubsub::subscription::SubscriptionConfig` field
//! names so the subscription builder's translation to the bus client is a
//! direct field copy.

/// Bus-facing delivery tunables for a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDeliveryPolicy {
    filter_expression: String,
    ack_deadline_seconds: i32,
    enable_message_ordering: bool,
    enable_exactly_once_delivery: bool,
}

impl MessageDeliveryPolicy {
    pub fn new(
        filter_expression: impl Into<String>,
        ack_deadline_seconds: i32,
        enable_message_ordering: bool,
        enable_exactly_once_delivery: bool,
    ) -> Self {
        Self {
            filter_expression: filter_expression.into(),
            ack_deadline_seconds,
            enable_message_ordering,
            enable_exactly_once_delivery,
        }
    }

    pub fn filter_expression(&self) -> &str {
        &self.filter_expression
    }

    pub fn ack_deadline_seconds(&self) -> i32 {
        self.ack_deadline_seconds
    }

    pub fn enable_message_ordering(&self) -> bool {
        self.enable_message_ordering
    }

    pub fn enable_exactly_once_delivery(&self) -> bool {
        self.enable_exactly_once_delivery
    }

    /// `true` when a non-empty filter expression is set; the subscription
    /// builder uses this to decide whether `filter` belongs in an
    /// update mask (emulator mode aside).
    pub fn has_filter(&self) -> bool {
        !self.filter_expression.is_empty()
    }
}

impl Default for MessageDeliveryPolicy {
    fn default() -> Self {
        Self {
            filter_expression: String::new(),
            ack_deadline_seconds: 10,
            enable_message_ordering: false,
            enable_exactly_once_delivery: false,
        }
    }
}
