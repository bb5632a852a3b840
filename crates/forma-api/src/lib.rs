pub mod auth;
pub mod credentials;
pub mod error;
pub mod events;
pub mod middleware;
pub mod pagination;
pub mod router;
pub mod state;
pub mod tasks;
pub mod users;

pub use error::ApiError;
pub use router::router;
pub use state::{AppState, AppStateInner};
pub use tasks::TaskSchema;
