//! Stock GZip middleware (SPEC_FULL.md §4.4).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::io::{Read, Write};

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

// Layer 3: Internal module imports
use super::traits::{ChainLink, MiddlewareFactory, PublishError};
use crate::message::{HandlerOutcome, Message};

const CONTENT_ENCODING: &str = "Content-Encoding";
const GZIP: &str = "gzip";

/// Compresses outgoing payloads and transparently decompresses incoming
/// ones tagged `Content-Encoding: gzip` (§4.4, §8 round-trip law).
#[derive(Debug, Default, Clone, Copy)]
pub struct GZipMiddleware;

impl MiddlewareFactory for GZipMiddleware {
    fn wrap(&self, next: Box<dyn ChainLink>) -> Box<dyn ChainLink> {
        Box::new(GZipLink { next })
    }
}

struct GZipLink {
    next: Box<dyn ChainLink>,
}

#[async_trait]
impl ChainLink for GZipLink {
    async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
        let is_gzipped = message
            .attributes()
            .get(CONTENT_ENCODING)
            .map(|v| v.eq_ignore_ascii_case(GZIP))
            .unwrap_or(false);

        if !is_gzipped {
            return self.next.on_message(message).await;
        }

        let mut decoder = GzDecoder::new(message.payload());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|err| HandlerOutcome::Failed(Box::new(err)))?;

        let mut attributes = message.attributes().clone();
        attributes.remove(CONTENT_ENCODING);
        let decoded = message.with_payload(decompressed, attributes);

        self.next.on_message(decoded).await
    }

    async fn on_publish(
        &self,
        data: Vec<u8>,
        ordering_key: Option<String>,
        mut attributes: HashMap<String, String>,
    ) -> Result<(), PublishError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&data)
            .map_err(|err| PublishError::BusClient(Box::new(err)))?;
        let compressed = encoder
            .finish()
            .map_err(|err| PublishError::BusClient(Box::new(err)))?;

        attributes.insert(CONTENT_ENCODING.to_string(), GZIP.to_string());

        self.next
            .on_publish(compressed, ordering_key, attributes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct CapturingTerminal {
        captured: Arc<Mutex<Option<(Vec<u8>, HashMap<String, String>)>>>,
    }

    #[async_trait]
    impl ChainLink for CapturingTerminal {
        async fn on_message(&self, message: Message) -> Result<(), HandlerOutcome> {
            *self.captured.lock().unwrap() =
                Some((message.payload().to_vec(), message.attributes().clone()));
            Ok(())
        }

        async fn on_publish(
            &self,
            data: Vec<u8>,
            _ordering_key: Option<String>,
            attributes: HashMap<String, String>,
        ) -> Result<(), PublishError> {
            *self.captured.lock().unwrap() = Some((data, attributes));
            Ok(())
        }
    }

    #[tokio::test]
    async fn round_trips_payload_through_publish_and_message() {
        let captured = Arc::new(Mutex::new(None));
        let publish_chain =
            GZipMiddleware.wrap(Box::new(CapturingTerminal { captured: captured.clone() }));

        let original = b"hello fastpubsub".to_vec();
        publish_chain
            .on_publish(original.clone(), None, HashMap::new())
            .await
            .unwrap();

        let (compressed, attrs) = captured.lock().unwrap().take().unwrap();
        assert_eq!(attrs.get(CONTENT_ENCODING).map(String::as_str), Some(GZIP));
        assert_ne!(compressed, original);

        let message = Message::new("m", compressed, attrs, "ack", 0);
        let message_chain =
            GZipMiddleware.wrap(Box::new(CapturingTerminal { captured: captured.clone() }));
        message_chain.on_message(message).await.unwrap();

        let (payload, attrs) = captured.lock().unwrap().take().unwrap();
        assert_eq!(payload, original);
        assert!(!attrs.contains_key(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn passes_through_uncompressed_messages_untouched() {
        let captured = Arc::new(Mutex::new(None));
        let chain = GZipMiddleware.wrap(Box::new(CapturingTerminal { captured: captured.clone() }));

        let message = Message::new("m", b"plain".to_vec(), HashMap::new(), "ack", 0);
        chain.on_message(message).await.unwrap();

        let (payload, _) = captured.lock().unwrap().take().unwrap();
        assert_eq!(payload, b"plain");
    }
}
