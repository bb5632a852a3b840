use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;

use forma_db::Database;
use forma_db::models::NewEvent;
use forma_types::api::{
    Claims, MessageResponse, SubmitEventRequest, SubmitEventResponse, UpdateStatusRequest,
};
use forma_types::models::{EventStatus, EventSubmission};

use crate::error::ApiError;
use crate::pagination::{PageQuery, fetch_page};
use crate::state::{AppState, blocking};

/// POST /api/event: public form submission. Every field is optional;
/// status defaults to `waiting`.
pub async fn submit_event(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SubmitEventRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let event = NewEvent {
        submitter_name: req.submitter_name,
        whatsapp_number: req.whatsapp_number,
        instagram_url: req.instagram_url,
        event_name: req.event_name,
        event_date: req.event_date,
        file_upload_ref: req.file_upload_ref,
        status: req.status.unwrap_or_default(),
    };

    let db = state.clone();
    let id = blocking(move || Ok(db.db.insert_event(&event)?)).await?;

    info!("Event submission {} received", id);

    Ok(Json(SubmitEventResponse {
        message: "Form submitted successfully!".into(),
        id,
    }))
}

/// GET /api/event?page=&limit=
pub async fn list_events(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let page = fetch_page::<_, EventSubmission, _, _>(
        &state,
        &query,
        Database::list_events,
        Database::count_events,
    )
    .await?;

    Ok(Json(page))
}

/// PUT /api/event/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateStatusRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let status: EventStatus = req
        .status
        .as_deref()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::Validation("Invalid status value.".into()))?;

    let db = state.clone();
    let changed = blocking(move || Ok(db.db.update_event_status(id, status.as_str())?)).await?;

    if changed == 0 {
        return Err(ApiError::NotFound("Event not found."));
    }

    info!("Event {} marked {} by user {}", id, status, claims.id);

    Ok(Json(MessageResponse::new("Status updated successfully!")))
}
