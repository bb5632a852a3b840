use std::fmt;
use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use tracing::info;

use forma_db::models::TaskFields;
use forma_types::api::{
    Claims, CreateTaskRequest, DeleteTaskResponse, PatchTaskRequest, ReplaceTaskRequest,
};
use forma_types::models::Task;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which task columns a create or full replace must supply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSchema {
    /// Only `title` is required.
    Basic,
    /// `title`, `pic_name`, `start_date` and `end_date` are required.
    #[default]
    Extended,
}

impl FromStr for TaskSchema {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            other => Err(anyhow::anyhow!(
                "unknown task schema '{}' (expected basic or extended)",
                other
            )),
        }
    }
}

impl fmt::Display for TaskSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Extended => f.write_str("extended"),
        }
    }
}

/// Raw task columns as they arrive, before validation.
struct Draft {
    title: Option<String>,
    description: Option<String>,
    pic_name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl From<CreateTaskRequest> for Draft {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            pic_name: req.pic_name,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

impl TaskSchema {
    fn validate(self, draft: Draft) -> Result<TaskFields, ApiError> {
        let title = non_blank(draft.title).ok_or_else(|| required("title"))?;
        let pic_name = non_blank(draft.pic_name);
        let start_date = non_blank(draft.start_date);
        let end_date = non_blank(draft.end_date);

        if self == Self::Extended {
            if pic_name.is_none() {
                return Err(required("pic_name"));
            }
            if start_date.is_none() {
                return Err(required("start_date"));
            }
            if end_date.is_none() {
                return Err(required("end_date"));
            }
        }

        let start = start_date.as_deref().map(|d| parse_date("start_date", d)).transpose()?;
        let end = end_date.as_deref().map(|d| parse_date("end_date", d)).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ApiError::Validation("end_date must not be before start_date".into()));
            }
        }

        Ok(TaskFields {
            title,
            description: draft.description,
            pic_name,
            start_date,
            end_date,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(field: &str) -> ApiError {
    ApiError::Validation(format!("{field} is required"))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ApiError::Validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found")
}

/// GET /api/tasks: every task, newest first.
pub async fn list_tasks(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || Ok(db.db.list_tasks()?)).await?;

    let tasks: Vec<Task> = rows.into_iter().map(Task::from).collect();
    Ok(Json(tasks))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = blocking(move || Ok(db.db.get_task(id)?))
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(Task::from(row)))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateTaskRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = state.task_schema.validate(req.into())?;

    let db = state.clone();
    let row = blocking(move || Ok(db.db.insert_task(&fields)?)).await?;

    info!("Task {} created", row.id);

    Ok((StatusCode::CREATED, Json(Task::from(row))))
}

/// PATCH /api/tasks/{id}: update any of title, description, completed.
pub async fn patch_task(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<PatchTaskRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.is_empty() {
        return Err(ApiError::Validation(
            "Provide at least one of title, description, completed".into(),
        ));
    }

    let title = match req.title {
        Some(title) => Some(non_blank(Some(title)).ok_or_else(|| {
            ApiError::Validation("title must not be empty".into())
        })?),
        None => None,
    };
    let description = req.description;
    let completed = req.completed;

    let db = state.clone();
    let row = blocking(move || {
        Ok(db
            .db
            .patch_task(id, title.as_deref(), description.as_deref(), completed)?)
    })
    .await?
    .ok_or_else(task_not_found)?;

    Ok(Json(Task::from(row)))
}

/// PUT /api/tasks/{id}: full replace with the same rules as create.
pub async fn replace_task(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<ReplaceTaskRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let completed = req.completed;
    let fields = state.task_schema.validate(Draft {
        title: req.title,
        description: req.description,
        pic_name: req.pic_name,
        start_date: req.start_date,
        end_date: req.end_date,
    })?;

    let db = state.clone();
    let row = blocking(move || Ok(db.db.replace_task(id, &fields, completed)?))
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(Task::from(row)))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let deleted = blocking(move || Ok(db.db.delete_task(id)?)).await?;

    if !deleted {
        return Err(task_not_found());
    }

    info!("Task {} deleted by user {}", id, claims.id);

    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".into(),
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(
        title: Option<&str>,
        pic: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Draft {
        Draft {
            title: title.map(str::to_string),
            description: Some("details".to_string()),
            pic_name: pic.map(str::to_string),
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn basic_schema_needs_only_title() {
        let fields = TaskSchema::Basic
            .validate(draft(Some(" Buy milk "), None, None, None))
            .unwrap();
        assert_eq!(fields.title, "Buy milk");
        assert_eq!(fields.description.as_deref(), Some("details"));
        assert!(fields.pic_name.is_none());

        let err = TaskSchema::Basic.validate(draft(Some("   "), None, None, None)).unwrap_err();
        assert_eq!(message(err), "title is required");
    }

    #[test]
    fn extended_schema_requires_assignment_and_dates() {
        let err = TaskSchema::Extended
            .validate(draft(Some("Booth setup"), None, Some("2024-05-01"), Some("2024-05-02")))
            .unwrap_err();
        assert_eq!(message(err), "pic_name is required");

        let err = TaskSchema::Extended
            .validate(draft(Some("Booth setup"), Some("Rina"), None, Some("2024-05-02")))
            .unwrap_err();
        assert_eq!(message(err), "start_date is required");

        let err = TaskSchema::Extended
            .validate(draft(Some("Booth setup"), Some("Rina"), Some("2024-05-01"), Some("")))
            .unwrap_err();
        assert_eq!(message(err), "end_date is required");

        let fields = TaskSchema::Extended
            .validate(draft(
                Some("Booth setup"),
                Some("Rina"),
                Some("2024-05-01"),
                Some("2024-05-01"),
            ))
            .unwrap();
        assert_eq!(fields.pic_name.as_deref(), Some("Rina"));
        assert_eq!(fields.end_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn dates_must_be_well_formed_and_ordered() {
        let err = TaskSchema::Basic
            .validate(draft(Some("t"), None, Some("01/05/2024"), None))
            .unwrap_err();
        assert_eq!(message(err), "start_date must be a date in YYYY-MM-DD format");

        let err = TaskSchema::Extended
            .validate(draft(Some("t"), Some("Rina"), Some("2024-05-03"), Some("2024-05-01")))
            .unwrap_err();
        assert_eq!(message(err), "end_date must not be before start_date");
    }

    #[test]
    fn schema_parses_from_config_values() {
        assert_eq!("basic".parse::<TaskSchema>().unwrap(), TaskSchema::Basic);
        assert_eq!(" Extended ".parse::<TaskSchema>().unwrap(), TaskSchema::Extended);
        assert!("full".parse::<TaskSchema>().is_err());
        assert_eq!(TaskSchema::default(), TaskSchema::Extended);
    }
}
