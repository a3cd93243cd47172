//! The task manager: fleet of poll tasks under one shutdown scope
//! (SPEC_FULL.md §4.7).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::broker::BrokerConfig;
use crate::client::BusClient;
use crate::observability::ApmProvider;
use crate::subscriber::Subscriber;
use crate::task::poll::PollTask;

/// Owns one `PollTask` per selected subscriber, spawns their `run()` loops,
/// and aggregates readiness/liveness (§4.7).
pub struct TaskManager {
    bus_client: Arc<dyn BusClient>,
    apm_provider: Arc<dyn ApmProvider>,
    config: BrokerConfig,
    tasks: Vec<Arc<PollTask>>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    pub fn new(bus_client: Arc<dyn BusClient>, apm_provider: Arc<dyn ApmProvider>, config: BrokerConfig) -> Self {
        Self {
            bus_client,
            apm_provider,
            config,
            tasks: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Constructs a `PollTask` for `subscriber` and stores it. Calling this
    /// after `start()` is permitted: the new task simply joins on the next
    /// `start()` call.
    pub fn create_task(&mut self, subscriber: Arc<Subscriber>) {
        self.tasks.push(Arc::new(PollTask::new(
            subscriber,
            self.bus_client.clone(),
            self.apm_provider.clone(),
            self.config,
        )));
    }

    /// Spawns every stored task's `run()` loop; returns once all are
    /// spawned, not when they exit (§4.7 `start`).
    pub fn start(&mut self) {
        for task in &self.tasks {
            let task = task.clone();
            self.handles.push(tokio::spawn(async move {
                task.run().await;
            }));
        }
    }

    /// `alive()` — subscriber name → `task_alive()` (§4.7).
    pub fn alive(&self) -> HashMap<String, bool> {
        self.tasks
            .iter()
            .map(|task| (task.name().to_string(), task.task_alive()))
            .collect()
    }

    /// `ready()` — subscriber name → `task_ready()` (§4.7).
    pub fn ready(&self) -> HashMap<String, bool> {
        self.tasks
            .iter()
            .map(|task| (task.name().to_string(), task.task_ready()))
            .collect()
    }

    /// Signals every task to exit, then awaits their completion (§4.7
    /// `shutdown`).
    pub async fn shutdown(&mut self) {
        for task in &self.tasks {
            task.shutdown();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}
