//! Database row types. These map directly to SQLite rows and stay
//! distinct from the API models so the store layer owns its own shape.

use forma_types::models::{EventStatus, EventSubmission, Task, UserProfile};
use tracing::warn;

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

pub struct EventRow {
    pub id: i64,
    pub submitter_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub instagram_url: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    pub file_upload_ref: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<EventRow> for EventSubmission {
    fn from(row: EventRow) -> Self {
        // The CHECK constraint keeps this unreachable for rows written by us.
        let status = row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt status on event {}: {}", row.id, e);
            EventStatus::default()
        });

        Self {
            id: row.id,
            submitter_name: row.submitter_name,
            whatsapp_number: row.whatsapp_number,
            instagram_url: row.instagram_url,
            event_name: row.event_name,
            event_date: row.event_date,
            file_upload_ref: row.file_upload_ref,
            status,
            created_at: row.created_at,
        }
    }
}

/// Columns supplied by the caller when a form is submitted.
#[derive(Debug, Default)]
pub struct NewEvent {
    pub submitter_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub instagram_url: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    pub file_upload_ref: Option<String>,
    pub status: EventStatus,
}

pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub pic_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            pic_name: row.pic_name,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

/// Writable task columns shared by create and full replace.
#[derive(Debug, Clone, Default)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub pic_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
