//! The poll task: the per-subscriber pull → dispatch → ack/nack loop
//! (SPEC_FULL.md §4.8).

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::Instrument;

// Layer 3: Internal module imports
use crate::broker::BrokerConfig;
use crate::client::{with_timeout, BusClient, ReceivedMessage};
use crate::message::{HandlerOutcome, Message};
use crate::observability::ApmProvider;
use crate::subscriber::Subscriber;
use crate::task::classify::{classify, Classification};

fn translate(received: ReceivedMessage) -> Message {
    Message::new(
        received.message_id,
        received.data,
        received.attributes,
        received.ack_id,
        received.delivery_attempt.unwrap_or(0),
    )
}

/// One concurrently scheduled unit driving a single subscription's pull
/// loop (§4.8). `ready`/`running` are the probe predicates consumed by
/// `TaskManager::alive`/`ready`.
pub struct PollTask {
    subscriber: Arc<Subscriber>,
    bus_client: Arc<dyn BusClient>,
    apm_provider: Arc<dyn ApmProvider>,
    config: BrokerConfig,
    ready: AtomicBool,
    running: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollTask {
    pub fn new(
        subscriber: Arc<Subscriber>,
        bus_client: Arc<dyn BusClient>,
        apm_provider: Arc<dyn ApmProvider>,
        config: BrokerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            subscriber,
            bus_client,
            apm_provider,
            config,
            ready: AtomicBool::new(false),
            running: AtomicBool::new(false),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn name(&self) -> &str {
        self.subscriber.name()
    }

    /// `task_ready()` (§4.8).
    pub fn task_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// `task_alive()` (§4.8).
    pub fn task_alive(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals the loop to exit at its next suspension point.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Runs the pull loop until shutdown or a fatal bus error (§4.8 `run`).
    pub async fn run(self: Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let max_messages = self.subscriber.control_flow_policy().max_messages();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    break;
                }
                pulled = with_timeout(
                    self.config.operation_timeout(),
                    self.bus_client.pull(self.subscriber.subscription_name(), max_messages),
                ) => {
                    match pulled {
                        Ok(messages) => {
                            self.ready.store(true, Ordering::SeqCst);
                            for received in messages {
                                let message = translate(received);
                                let subscriber = self.subscriber.clone();
                                let bus_client = self.bus_client.clone();
                                let apm_provider = self.apm_provider.clone();
                                let config = self.config;
                                in_flight.spawn(async move {
                                    consume(subscriber, bus_client, apm_provider, config, message).await;
                                });
                            }
                        }
                        Err(err) => {
                            match classify(&err) {
                                Classification::Retryable => {
                                    self.ready.store(false, Ordering::SeqCst);
                                    tracing::warn!(subscriber = %self.name(), error = %err, "retryable bus error");
                                }
                                Classification::Fatal => {
                                    self.ready.store(false, Ordering::SeqCst);
                                    tracing::error!(subscriber = %self.name(), error = %err, "fatal bus error, stopping task");
                                    break;
                                }
                            }
                        }
                    }
                }
            }

            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(self.config.poll_sleep_interval()) => {}
            }
        }

        while in_flight.join_next().await.is_some() {}
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Runs one message through the subscriber's callstack and ack/nacks based
/// on the outcome (§4.8 `_consume`).
async fn consume(
    subscriber: Arc<Subscriber>,
    bus_client: Arc<dyn BusClient>,
    apm_provider: Arc<dyn ApmProvider>,
    config: BrokerConfig,
    message: Message,
) {
    let span = tracing::info_span!(
        "consume",
        subscriber = %subscriber.name(),
        topic = %subscriber.topic_name(),
        message_id = %message.id(),
    );

    async move {
        let _transaction = apm_provider.background_transaction(subscriber.name());

        if apm_provider.active() {
            apm_provider.set_distributed_trace_context(message.attributes());
        }

        let ack_token = message.ack_token().to_string();
        let subscription_name = subscriber.subscription_name().to_string();
        let chain = subscriber.build_callstack();

        let should_ack = match chain.on_message(message).await {
            Ok(()) => true,
            Err(HandlerOutcome::Drop) => true,
            Err(HandlerOutcome::Retry) => false,
            Err(HandlerOutcome::Failed(err)) => {
                tracing::error!(error = %err, "handler failed");
                false
            }
        };

        let result = if should_ack {
            with_timeout(config.operation_timeout(), bus_client.ack(&[ack_token], &subscription_name)).await
        } else {
            with_timeout(config.operation_timeout(), bus_client.nack(&[ack_token], &subscription_name)).await
        };

        if let Err(err) = result {
            tracing::warn!(error = %err, "ack/nack call failed");
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::BusClientError;
    use crate::observability::NoopApmProvider;
    use crate::policy::{
        LifecyclePolicy, MessageControlFlowPolicy, MessageDeliveryPolicy, MessageRetryPolicy,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedBusClient {
        pulls: Mutex<Vec<Result<Vec<ReceivedMessage>, BusClientError>>>,
        acked: Mutex<Vec<(Vec<String>, String)>>,
        nacked: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl ScriptedBusClient {
        fn new(pulls: Vec<Result<Vec<ReceivedMessage>, BusClientError>>) -> Self {
            Self {
                pulls: Mutex::new(pulls),
                acked: Mutex::new(vec![]),
                nacked: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl BusClient for ScriptedBusClient {
        async fn create_topic(&self, _: &str, _: bool) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn create_subscription(
            &self,
            _: &str,
            _: &str,
            _: &MessageRetryPolicy,
            _: &MessageDeliveryPolicy,
            _: Option<&crate::policy::DeadLetterPolicy>,
        ) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn update_subscription(
            &self,
            _: &str,
            _: &str,
            _: &MessageRetryPolicy,
            _: &MessageDeliveryPolicy,
            _: Option<&crate::policy::DeadLetterPolicy>,
        ) -> Result<(), BusClientError> {
            Ok(())
        }
        async fn pull(&self, _: &str, _: u32) -> Result<Vec<ReceivedMessage>, BusClientError> {
            let mut pulls = self.pulls.lock().unwrap();
            if pulls.is_empty() {
                Ok(vec![])
            } else {
                pulls.remove(0)
            }
        }
        async fn ack(&self, ack_tokens: &[String], subscription_name: &str) -> Result<(), BusClientError> {
            self.acked
                .lock()
                .unwrap()
                .push((ack_tokens.to_vec(), subscription_name.to_string()));
            Ok(())
        }
        async fn nack(&self, ack_tokens: &[String], subscription_name: &str) -> Result<(), BusClientError> {
            self.nacked
                .lock()
                .unwrap()
                .push((ack_tokens.to_vec(), subscription_name.to_string()));
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

    fn received(ack_id: &str) -> ReceivedMessage {
        ReceivedMessage {
            message_id: "m-1".to_string(),
            data: b"payload".to_vec(),
            attributes: HashMap::new(),
            ack_id: ack_id.to_string(),
            delivery_attempt: None,
        }
    }

    fn subscriber_with_handler(handler: Arc<dyn crate::subscriber::Handler>) -> Arc<Subscriber> {
        Arc::new(Subscriber::new(
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
        ))
    }

    #[tokio::test]
    async fn s4_ack_on_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let handler: Arc<dyn crate::subscriber::Handler> = Arc::new(move |_msg: Message| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        let client = Arc::new(ScriptedBusClient::new(vec![Ok(vec![received("T-1")])]));
        let task = Arc::new(PollTask::new(
            subscriber_with_handler(handler),
            client.clone(),
            Arc::new(NoopApmProvider),
            BrokerConfig::default(),
        ));

        let run_task = task.clone();
        let handle = tokio::spawn(async move { run_task.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.acked.lock().unwrap().len(), 1);
        assert!(client.nacked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn s5_retry_on_handler_exception_stays_alive() {
        let handler: Arc<dyn crate::subscriber::Handler> =
            Arc::new(|_msg: Message| async { Err(HandlerOutcome::Retry) });

        let client = Arc::new(ScriptedBusClient::new(vec![Ok(vec![received("T-1")])]));
        let task = Arc::new(PollTask::new(
            subscriber_with_handler(handler),
            client.clone(),
            Arc::new(NoopApmProvider),
            BrokerConfig::default(),
        ));

        let run_task = task.clone();
        let handle = tokio::spawn(async move { run_task.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(client.nacked.lock().unwrap().len(), 1);
        assert!(client.acked.lock().unwrap().is_empty());
        assert!(task.task_ready());
    }

    #[tokio::test]
    async fn s6_fatal_bus_error_stops_task() {
        let handler: Arc<dyn crate::subscriber::Handler> = Arc::new(|_msg: Message| async { Ok(()) });
        let client = Arc::new(ScriptedBusClient::new(vec![Err(BusClientError::PermissionDenied(
            "nope".to_string(),
        ))]));
        let task = Arc::new(PollTask::new(
            subscriber_with_handler(handler),
            client,
            Arc::new(NoopApmProvider),
            BrokerConfig::default(),
        ));

        tokio::time::timeout(Duration::from_secs(2), task.clone().run())
            .await
            .unwrap();

        assert!(!task.task_alive());
        assert!(!task.task_ready());
    }
}
