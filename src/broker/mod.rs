//! The top-level façade (SPEC_FULL.md §4.6): owns the root router, the
//! subscription builder, and the task manager; exposes `start`/`shutdown`/
//! `alive`/`ready`/`info`.

pub mod config;

// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// Layer 3: Internal module imports
use crate::builder::SubscriptionBuilder;
use crate::client::BusClient;
use crate::error::FastPubSubError;
use crate::middleware::MiddlewareFactory;
use crate::observability::{ApmProvider, NoopApmProvider};
use crate::router::Router;
use crate::task::TaskManager;

pub use config::{BrokerConfig, BrokerConfigBuilder};

/// Environment variable naming a comma-separated allow-list of subscriber
/// aliases to start; empty or absent means "run every registered
/// subscriber" (§4.6).
pub const SUBSCRIBERS_ENV_VAR: &str = "FASTPUBSUB_SUBSCRIBERS";

/// The application's single entry point into the core: validates
/// `project_id`, owns one root `Router`, and orchestrates the subscription
/// builder and task manager through `start`/`shutdown` (§3, §4.6).
pub struct Broker {
    project_id: String,
    router: Router,
    config: BrokerConfig,
    subscription_builder: SubscriptionBuilder,
    task_manager: TaskManager,
}

impl Broker {
    pub fn new(
        project_id: impl Into<String>,
        bus_client: Arc<dyn BusClient>,
        config: BrokerConfig,
    ) -> Result<Self, FastPubSubError> {
        Self::with_apm_provider(project_id, bus_client, config, Arc::new(NoopApmProvider))
    }

    pub fn with_apm_provider(
        project_id: impl Into<String>,
        bus_client: Arc<dyn BusClient>,
        config: BrokerConfig,
        apm_provider: Arc<dyn ApmProvider>,
    ) -> Result<Self, FastPubSubError> {
        let project_id = project_id.into().trim().to_string();
        if project_id.is_empty() {
            return Err(FastPubSubError::InvalidProjectId);
        }

        let mut router = Router::new("", bus_client.clone())?;
        router.propagate_project_id(&project_id);
        router.propagate_config(config);

        let emulator_mode = SubscriptionBuilder::detect_emulator_mode();

        Ok(Self {
            project_id,
            router,
            config,
            subscription_builder: SubscriptionBuilder::new(bus_client.clone(), emulator_mode, config),
            task_manager: TaskManager::new(bus_client, apm_provider, config),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// The root router, open for registration until `start()` is called.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn include_router(&mut self, child: Router) -> Result<(), FastPubSubError> {
        self.router.include_router(child)?;
        Ok(())
    }

    pub fn include_middleware(&mut self, middleware: Arc<dyn MiddlewareFactory>) {
        self.router.include_middleware(middleware);
    }

    fn selected_subscribers() -> HashSet<String> {
        std::env::var(SUBSCRIBERS_ENV_VAR)
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|alias| alias.trim().to_lowercase())
                    .filter(|alias| !alias.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reconciles bus state and launches one poll task per selected
    /// subscriber (§4.6 `start`).
    pub async fn start(&mut self) -> Result<(), FastPubSubError> {
        let selected = Self::selected_subscribers();
        let mut subscribers = self.router.get_subscribers();

        if !selected.is_empty() {
            for alias in &selected {
                if !subscribers.contains_key(alias) {
                    tracing::warn!(alias = %alias, "selected subscriber alias not found; skipping");
                }
            }
            subscribers.retain(|alias, _| selected.contains(alias));
        }

        if subscribers.is_empty() {
            return Err(FastPubSubError::NoSubscribersSelected);
        }

        for subscriber in subscribers.into_values() {
            self.subscription_builder.build(&subscriber).await?;
            self.task_manager.create_task(subscriber);
        }

        self.task_manager.start();
        Ok(())
    }

    /// Waits for orderly cancellation of every poll task (§4.6 `shutdown`).
    pub async fn shutdown(&mut self) {
        self.task_manager.shutdown().await;
    }

    /// `false` if no tasks are running or any task has stopped (§4.6
    /// `alive`).
    pub fn alive(&self) -> bool {
        let states = self.task_manager.alive();
        !states.is_empty() && states.values().all(|alive| *alive)
    }

    /// `false` if no tasks are running or any task is unready (§4.6
    /// `ready`).
    pub fn ready(&self) -> bool {
        let states = self.task_manager.ready();
        !states.is_empty() && states.values().all(|ready| *ready)
    }

    /// Opaque aggregated process/task info (§4.6 `info`).
    pub fn info(&self) -> HashMap<String, serde_json::Value> {
        let mut info = HashMap::new();
        info.insert(
            "project_id".to_string(),
            serde_json::Value::String(self.project_id.clone()),
        );
        info.insert(
            "alive".to_string(),
            serde_json::to_value(self.task_manager.alive()).unwrap_or_default(),
        );
        info.insert(
            "ready".to_string(),
            serde_json::to_value(self.task_manager.ready()).unwrap_or_default(),
        );
        info
    }
}
