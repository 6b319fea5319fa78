pub mod attachment;
pub mod comment;
pub mod contact;
pub mod organization;
pub mod team;
pub mod ticket;
pub mod user;

use axum::Router;

use crate::adapters::http::app_state::AppState;
use crate::app_error::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/organizations", organization::router())
        .nest("/users", user::router())
        .nest("/teams", team::router())
        .nest("/contacts", contact::router())
        .nest("/tickets", ticket::router())
        .nest("/comments", comment::router())
        .nest("/attachments", attachment::router())
}

/// Parses a numeric path segment; `label` names the id in the error.
pub(crate) fn parse_id(raw: &str, label: &str) -> AppResult<i64> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid {label}")))
}
