use std::sync::Arc;

use tracing::error;

use forma_db::Database;

use crate::credentials::TokenIssuer;
use crate::error::ApiError;
use crate::tasks::TaskSchema;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenIssuer,
    pub task_schema: TaskSchema,
}

/// Run blocking work (SQLite calls, password hashing) off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Store(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
