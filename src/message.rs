//! The immutable `Message` value (SPEC_FULL.md §3) and the handler's
//! acknowledgement-signalling `HandlerOutcome` (§7, §9b).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

/// A bus delivery translated into the core's own representation.
///
/// Built once by the poll task from a `ReceivedMessage` (see
/// `client::ReceivedMessage` and §4.8 "Message translation"), consumed by the
/// middleware chain, and dropped when `_consume` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: String,
    payload: Vec<u8>,
    attributes: HashMap<String, String>,
    ack_token: String,
    delivery_attempt: u32,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        payload: Vec<u8>,
        attributes: HashMap<String, String>,
        ack_token: impl Into<String>,
        delivery_attempt: u32,
    ) -> Self {
        Self {
            id: id.into(),
            payload,
            attributes,
            ack_token: ack_token.into(),
            delivery_attempt,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Byte length of `payload`, computed rather than stored so a
    /// middleware that rewrites `payload` (e.g. GZip) cannot leave it stale.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn ack_token(&self) -> &str {
        &self.ack_token
    }

    pub fn delivery_attempt(&self) -> u32 {
        self.delivery_attempt
    }

    /// Builds a copy of this message with `payload` and `attributes`
    /// replaced, preserving identity/ack metadata. Used by middlewares
    /// (e.g. GZip) that must rewrite the body without losing ack/delivery
    /// context (§4.4: "Preserves all other Message fields").
    pub fn with_payload(&self, payload: Vec<u8>, attributes: HashMap<String, String>) -> Self {
        Self {
            id: self.id.clone(),
            payload,
            attributes,
            ack_token: self.ack_token.clone(),
            delivery_attempt: self.delivery_attempt,
        }
    }
}

/// The three ways a handler invocation can resolve, folded into one type so
/// `_consume` can match exhaustively (SPEC_FULL.md §9b).
///
/// A handler returning `Ok(())` acks. `Err(HandlerOutcome::Drop)` also acks
/// (the original's `Drop` exception: "treat as successfully consumed").
/// `Err(HandlerOutcome::Retry)` nacks, letting the bus redeliver per the
/// retry policy. `Err(HandlerOutcome::Failed(_))` nacks and is logged with
/// its source error.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Equivalent to the original's `Drop` exception: ack, do not retry.
    Drop,
    /// Equivalent to the original's `Retry` exception: nack, let the bus
    /// reschedule.
    Retry,
    /// Any other handler failure: nack and log.
    Failed(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for HandlerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => write!(f, "handler signalled Drop"),
            Self::Retry => write!(f, "handler signalled Retry"),
            Self::Failed(err) => write!(f, "handler failed: {err}"),
        }
    }
}

impl StdError for HandlerOutcome {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
