use serde::{Deserialize, Serialize};

use crate::models::EventStatus;

// -- JWT Claims --

/// Session token claims. Shared by the issuer and the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public projection of a user returned on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

// -- Events --

/// Event form body. Accepts the legacy form field names alongside the
/// English ones (English wins when both are sent), and coerces numeric or
/// boolean form values to text.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "RawSubmitEvent")]
pub struct SubmitEventRequest {
    pub submitter_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub instagram_url: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    pub file_upload_ref: Option<String>,
    pub status: Option<EventStatus>,
}

/// A scalar form value. HTML form encoders often send phone numbers as
/// JSON numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FormValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<FormValue> for String {
    fn from(value: FormValue) -> Self {
        match value {
            FormValue::Text(s) => s,
            FormValue::Integer(n) => n.to_string(),
            FormValue::Float(n) => n.to_string(),
            FormValue::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawSubmitEvent {
    submitter_name: Option<FormValue>,
    nama_lengkap_spg: Option<FormValue>,
    whatsapp_number: Option<FormValue>,
    no_whatsapp: Option<FormValue>,
    instagram_url: Option<FormValue>,
    event_name: Option<FormValue>,
    nama_event: Option<FormValue>,
    event_date: Option<FormValue>,
    tanggal_event: Option<FormValue>,
    file_upload_ref: Option<FormValue>,
    file_upload: Option<FormValue>,
    status: Option<EventStatus>,
}

fn either(preferred: Option<FormValue>, legacy: Option<FormValue>) -> Option<String> {
    preferred.or(legacy).map(String::from)
}

impl From<RawSubmitEvent> for SubmitEventRequest {
    fn from(raw: RawSubmitEvent) -> Self {
        Self {
            submitter_name: either(raw.submitter_name, raw.nama_lengkap_spg),
            whatsapp_number: either(raw.whatsapp_number, raw.no_whatsapp),
            instagram_url: raw.instagram_url.map(String::from),
            event_name: either(raw.event_name, raw.nama_event),
            event_date: either(raw.event_date, raw.tanggal_event),
            file_upload_ref: either(raw.file_upload_ref, raw.file_upload),
            status: raw.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitEventResponse {
    pub message: String,
    pub id: i64,
}

/// Status is kept as a raw string so unknown values are reported as a
/// validation failure rather than a body decoding failure.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

// -- Tasks --

#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pic_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplaceTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub pic_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl PatchTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    pub message: String,
    pub id: i64,
}
