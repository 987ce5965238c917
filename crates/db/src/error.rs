use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Component not found: {0}")]
    ComponentNotFound(Uuid),

    #[error("Concurrent update conflict for task {0}")]
    VersionConflict(Uuid),

    #[error("Stored record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
