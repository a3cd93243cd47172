//! Dead-letter policy (SPEC_FULL.md §3). Optional on a subscriber; when
//! present the subscription builder provisions both the DLQ topic (with a
//! default subscription, per §4.5) and wires it into the main subscription.

use thiserror::Error;

/// Raised when constructing a dead-letter policy with invalid bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeadLetterPolicyError {
    #[error("dead-letter topic_name must be non-empty")]
    EmptyTopicName,
    #[error("max_delivery_attempts must be between 5 and 100, got {0}")]
    DeliveryAttemptsOutOfRange(u32),
}

/// Where and after how many failed deliveries the bus redirects a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterPolicy {
    topic_name: String,
    max_delivery_attempts: u32,
}

impl DeadLetterPolicy {
    /// Pub/Sub's own allowed range for `max_delivery_attempts`.
    pub const MIN_DELIVERY_ATTEMPTS: u32 = 5;
    pub const MAX_DELIVERY_ATTEMPTS: u32 = 100;

    pub fn new(
        topic_name: impl Into<String>,
        max_delivery_attempts: u32,
    ) -> Result<Self, DeadLetterPolicyError> {
        let topic_name = topic_name.into();
        if topic_name.is_empty() {
            return Err(DeadLetterPolicyError::EmptyTopicName);
        }
        if !(Self::MIN_DELIVERY_ATTEMPTS..=Self::MAX_DELIVERY_ATTEMPTS)
            .contains(&max_delivery_attempts)
        {
            return Err(DeadLetterPolicyError::DeliveryAttemptsOutOfRange(
                max_delivery_attempts,
            ));
        }
        Ok(Self {
            topic_name,
            max_delivery_attempts,
        })
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn max_delivery_attempts(&self) -> u32 {
        self.max_delivery_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_topic() {
        assert_eq!(
            DeadLetterPolicy::new("", 5).unwrap_err(),
            DeadLetterPolicyError::EmptyTopicName
        );
    }

    #[test]
    fn rejects_out_of_range_attempts() {
        assert!(matches!(
            DeadLetterPolicy::new("dlq", 1).unwrap_err(),
            DeadLetterPolicyError::DeliveryAttemptsOutOfRange(1)
        ));
        assert!(matches!(
            DeadLetterPolicy::new("dlq", 200).unwrap_err(),
            DeadLetterPolicyError::DeliveryAttemptsOutOfRange(200)
        ));
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(DeadLetterPolicy::new("dlq", 5).is_ok());
        assert!(DeadLetterPolicy::new("dlq", 100).is_ok());
    }
}
