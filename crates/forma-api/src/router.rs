use axum::{
    Json, Router, middleware,
    routing::{get, patch, post, put},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, events, tasks, users};

/// Build the full route table.
///
/// Registration, login, the public event form and read-only listings are open.
/// Every other mutation, and the user listing, requires a bearer token.
pub fn router(state: AppState) -> Router {
    let guard = middleware::from_fn_with_state(state.clone(), require_auth);
    let _ = auth::dummy_hash();

    Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/api/user",
            get(users::list_users).route_layer(guard.clone()),
        )
        .route(
            "/api/event",
            get(events::list_events).post(events::submit_event),
        )
        .route(
            "/api/event/{id}/status",
            put(events::update_status).route_layer(guard.clone()),
        )
        .route(
            "/api/tasks",
            get(tasks::list_tasks).merge(post(tasks::create_task).route_layer(guard.clone())),
        )
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task).merge(
                patch(tasks::patch_task)
                    .put(tasks::replace_task)
                    .delete(tasks::delete_task)
                    .route_layer(guard),
            ),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
