mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use forma_api::credentials::TokenIssuer;
use forma_api::{AppState, AppStateInner};
use forma_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "forma=debug,forma_api=debug,forma_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.addr()?;

    // Init database
    let db = Database::open(&config.db_path, config.db_readers)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        tokens: TokenIssuer::new(&config.jwt_secret, config.token_ttl),
        task_schema: config.task_schema,
    });

    let app = forma_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Forma server listening on {}", addr);
    info!(
        "Task schema: {}, token lifetime: {}s",
        config.task_schema,
        config.token_ttl.num_seconds()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
