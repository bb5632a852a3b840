use std::sync::OnceLock;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use forma_types::api::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse};

use crate::credentials::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::{AppState, blocking};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 64;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Verified against when the email is unknown, so both login failures cost
/// one Argon2 verification.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Computed on first use. The router calls this at build time so the first
/// unknown-email login does not pay for an extra hash.
pub(crate) fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("forma-dummy-password").ok())
        .as_deref()
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    // Validate input
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::Validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    if !is_plausible_email(&email) {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let db = state.clone();
    let user_id = blocking(move || {
        // Fast path only; the UNIQUE constraint decides under concurrent sign-ups
        if db.db.email_exists(&email)? {
            return Err(email_taken());
        }

        let password_hash = hash_password(&req.password)?;

        db.db
            .create_user(&username, &email, &password_hash)?
            .ok_or_else(email_taken)
    })
    .await?;

    info!("User {} registered", user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful!".into(),
            id: user_id,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = blocking(move || {
        let email = req.email.trim();
        let Some(user) = db.db.get_user_by_email(email)? else {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(&req.password, dummy);
            }
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&req.password, &user.password)? {
            warn!("Failed login for user {}", user.id);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }

        Ok(user)
    })
    .await?;

    let token = state.tokens.issue(user.id, &user.email)?;

    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        message: "Login successful!".into(),
        token,
        user: PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}

fn email_taken() -> ApiError {
    ApiError::Conflict("Email is already registered.".into())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(is_plausible_email("a@b.c"));
        assert!(is_plausible_email("first.last@example.co.id"));
        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("no-at-sign"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@"));
        assert!(!is_plausible_email("us er@example.com"));
    }

    #[test]
    fn building_the_router_prepares_the_dummy_hash() {
        use std::sync::Arc;

        use crate::credentials::TokenIssuer;
        use crate::state::AppStateInner;
        use crate::tasks::TaskSchema;

        let dir = tempfile::tempdir().unwrap();
        let db = forma_db::Database::open(&dir.path().join("forma.db"), 1).unwrap();
        let state = Arc::new(AppStateInner {
            db,
            tokens: TokenIssuer::new("test-secret", chrono::Duration::hours(1)),
            task_schema: TaskSchema::default(),
        });

        let _app = crate::router::router(state);

        let dummy = DUMMY_HASH.get().cloned().flatten().unwrap();
        assert!(dummy.starts_with("$argon2id$"));
        assert!(!verify_password("not-the-dummy", &dummy).unwrap());
    }
}
