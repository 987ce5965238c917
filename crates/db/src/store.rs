use sqlx::SqlitePool;

use crate::error::DbError;
use crate::repositories::{
    AgentResultRepository, ComponentRepository, FeedbackRepository, TaskRepository,
};

/// Aggregate handle over the persistence layer.
///
/// The store exclusively owns task records; the orchestrator and the API
/// layer go through it rather than holding a pool of their own.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
    pub tasks: TaskRepository,
    pub agent_results: AgentResultRepository,
    pub components: ComponentRepository,
    pub feedback: FeedbackRepository,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: TaskRepository::new(pool.clone()),
            agent_results: AgentResultRepository::new(pool.clone()),
            components: ComponentRepository::new(pool.clone()),
            feedback: FeedbackRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connectivity probe for health reporting.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
