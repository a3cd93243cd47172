//! The middleware contract (SPEC_FULL.md §4.4, §9): a two-method chain link
//! interface, terminated by a command node that performs the actual effect.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::message::{HandlerOutcome, Message};

/// One link in a middleware callstack. Both middleware wrappers and the
/// terminal command nodes (`HandleMessageCommand`, `PublishMessageCommand`)
/// implement this single interface, mirroring the original's
/// `BaseMiddleware`/`Command` duality (§9 "Dynamic dispatch on
/// middleware/handler").
#[async_trait]
pub trait ChainLink: Send + Sync {
    /// Runs the message-handling side of the chain. A link whose terminus
    /// is a publish command must reject this with
    /// `PublishError::WrongTerminal`.
    async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome>;

    /// Runs the publish side of the chain. A link whose terminus is the
    /// message-handling command must reject this with a `HandlerOutcome`
    /// carrying the mismatch (there is no publish-side equivalent error
    /// type reachable from `on_message`, so this uses `PublishError`).
    async fn on_publish(
        &self,
        data: Vec<u8>,
        ordering_key: Option<String>,
        attributes: HashMap<String, String>,
    ) -> Result<(), PublishError>;
}

/// Failure surfaced while running a publish callstack.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The payload could not be serialized into a bus-compatible byte
    /// sequence (SPEC_FULL.md §4.3, §7 `UnserializablePayload`).
    #[error("payload is not serializable to bytes, str, or a JSON-compatible mapping")]
    UnserializablePayload,
    /// The bus client rejected the publish call.
    #[error("publish to bus failed: {0}")]
    BusClient(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Identity-comparable factory for a middleware: given the next link in the
/// chain, produces the wrapping link. Stored as `Arc<dyn MiddlewareFactory>`
/// in routers/subscribers/publishers so "no duplicates" can be checked via
/// `Arc::ptr_eq` (§3 "Middleware lists do not contain duplicates
/// (identity-based dedupe)").
pub trait MiddlewareFactory: Send + Sync {
    /// Wraps `next` with this middleware's behavior.
    fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink>;
}

/// Builds the outer-to-inner chain described in §4.2/§4.3: `middlewares[0]`
/// ends up outermost (first to run), `terminal` runs last.
pub fn build_chain(
    middlewares: &[std::sync::Arc<dyn MiddlewareFactory>],
    terminal: Box<dyn ChainLink>,
) -> Box<dyn ChainLink> {
    let mut chain = terminal;
    for factory in middlewares.iter().rev() {
        chain = factory.wrap(chain);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingTerminal {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChainLink for RecordingTerminal {
        async fn on_message(&self, _message: Message) -> Result<(), HandlerOutcome> {
            self.log.lock().unwrap().push("terminal".to_string());
            Ok(())
        }

        async fn on_publish(
            &self,
            _data: Vec<u8>,
            _ordering_key: Option<String>,
            _attributes: HashMap<String, String>,
        ) -> Result<(), PublishError> {
            Ok(())
        }
    }

    struct TaggedMiddleware {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    struct TaggedLink {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        next: Box<dyn ChainLink>,
    }

    #[async_trait]
    impl ChainLink for TaggedLink {
        async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
            self.log.lock().unwrap().push(self.tag.to_string());
            self.next.on_message(message).await
        }

        async fn on_publish(
            &self,
            data: Vec<u8>,
            ordering_key: Option<String>,
            attributes: HashMap<String, String>,
        ) -> Result<(), PublishError> {
            self.log.lock().unwrap().push(self.tag.to_string());
            self.next.on_publish(data, ordering_key, attributes).await
        }
    }

    impl MiddlewareFactory for TaggedMiddleware {
        fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink> {
            Box::new(TaggedLink {
                tag: self.tag,
                log: self.log.clone(),
                next,
            })
        }
    }

    #[tokio::test]
    async fn chain_executes_outer_to_inner_then_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let middlewares: Vec<Arc<dyn MiddlewareFactory>> = vec![
            Arc::new(TaggedMiddleware {
                tag: "U",
                log: log.clone(),
            }),
            Arc::new(TaggedMiddleware {
                tag: "C",
                log: log.clone(),
            }),
        ];

        let terminal = Box::new(RecordingTerminal { log: log.clone() });
        let chain = build_chain(&middlewares, terminal);

        let message = Message::new("m", vec![], HashMap::new(), "ack", 0);
        chain.on_message(message).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["U", "C", "terminal"]);
    }
}
