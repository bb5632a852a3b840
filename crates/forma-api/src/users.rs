use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use forma_db::Database;
use forma_types::models::UserProfile;

use crate::error::ApiError;
use crate::pagination::{PageQuery, fetch_page};
use crate::state::AppState;

/// GET /api/user?page=&limit=: password hashes are never part of the projection.
pub async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let page = fetch_page::<_, UserProfile, _, _>(
        &state,
        &query,
        Database::list_users,
        Database::count_users,
    )
    .await?;

    Ok(Json(page))
}
