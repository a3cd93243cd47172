//! The application shell (SPEC_FULL.md §9e, supplemented from
//! `original_source/fastpubsub/applications.py`'s `Application` class):
//! four ordered hook lists run around broker start/shutdown.

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;

// Layer 3: Internal module imports
use crate::broker::Broker;
use crate::error::FastPubSubError;

type Hook = Box<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Wraps a `Broker` with four ordered hook lists run around `start`/
/// `shutdown`, in registration order: `on_startup` then `broker.start()`
/// then `after_startup`; `on_shutdown` then `broker.shutdown()` then
/// `after_shutdown`. The HTTP/CLI surface that would register these hooks
/// remains external to the core (§1); only the hook-binding mechanics are
/// implemented here.
pub struct AppShell {
    broker: Broker,
    on_startup: Vec<Hook>,
    after_startup: Vec<Hook>,
    on_shutdown: Vec<Hook>,
    after_shutdown: Vec<Hook>,
}

impl AppShell {
    pub fn new(broker: Broker) -> Self {
        Self {
            broker,
            on_startup: Vec::new(),
            after_startup: Vec::new(),
            on_shutdown: Vec::new(),
            after_shutdown: Vec::new(),
        }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut Broker {
        &mut self.broker
    }

    pub fn on_startup<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_startup.push(Box::new(move || Box::pin(hook())));
    }

    pub fn after_startup<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.after_startup.push(Box::new(move || Box::pin(hook())));
    }

    pub fn on_shutdown<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_shutdown.push(Box::new(move || Box::pin(hook())));
    }

    pub fn after_shutdown<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.after_shutdown.push(Box::new(move || Box::pin(hook())));
    }

    async fn run_hooks(hooks: &[Hook]) {
        for hook in hooks {
            hook().await;
        }
    }

    /// Runs `on_startup`, then `broker.start()`, then `after_startup`.
    pub async fn start(&mut self) -> Result<(), FastPubSubError> {
        Self::run_hooks(&self.on_startup).await;
        self.broker.start().await?;
        Self::run_hooks(&self.after_startup).await;
        Ok(())
    }

    /// Runs `on_shutdown`, then `broker.shutdown()`, then `after_shutdown`.
    pub async fn shutdown(&mut self) {
        Self::run_hooks(&self.on_shutdown).await;
        self.broker.shutdown().await;
        Self::run_hooks(&self.after_shutdown).await;
    }
}
