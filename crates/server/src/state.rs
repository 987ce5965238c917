use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use db::TaskStore;
use events::EventBus;
use orchestrator::{scripted_registry, Orchestrator, ScriptedEvaluator};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: TaskStore,
    pub orchestrator: Orchestrator,
    pub event_bus: EventBus,
    pub config: ServerConfig,
    /// Registered agent names, reported by the detailed health endpoint.
    pub agent_names: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the standard pipeline over the given pool. The scripted agents
    /// and evaluator stand in until model-backed implementations land.
    pub fn new(pool: SqlitePool, config: ServerConfig) -> anyhow::Result<Self> {
        let store = TaskStore::new(pool);
        let event_bus = EventBus::new();

        let registry = scripted_registry()?;
        let agent_names = registry.names();
        let orchestrator = Orchestrator::new(
            store.clone(),
            registry,
            Arc::new(ScriptedEvaluator::passing()),
            event_bus.clone(),
            config.orchestrator_config(),
        )?;

        Ok(Self {
            store,
            orchestrator,
            event_bus,
            config,
            agent_names,
            started_at: Utc::now(),
        })
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
