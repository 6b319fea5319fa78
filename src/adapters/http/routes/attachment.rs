use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser},
    app_error::{AppError, AppResult},
    application::use_cases::attachment::CreateAttachment,
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attachments).post(create_attachment))
        .route("/{id}", get(get_attachment).delete(delete_attachment))
        .route("/{id}/ticket/{ticket_id}", post(link_ticket).delete(unlink_ticket))
        .route(
            "/{id}/comment/{comment_id}",
            post(link_comment).delete(unlink_comment),
        )
}

#[derive(Debug, Deserialize)]
struct ListAttachmentsParams {
    cursor: Option<String>,
    limit: Option<u32>,
}

async fn list_attachments(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListAttachmentsParams>,
) -> AppResult<impl IntoResponse> {
    let page = app_state
        .attachment_use_cases
        .list(
            &user,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_attachment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "attachment ID")?;
    let attachment = app_state.attachment_use_cases.get(&user, id).await?;
    Ok(Json(attachment))
}

async fn create_attachment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateAttachment>,
) -> AppResult<impl IntoResponse> {
    let created = app_state
        .attachment_use_cases
        .create(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_attachment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "attachment ID")?;
    app_state.attachment_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// The two-id link routes share one error message for either segment
/// being malformed.
fn parse_link_ids(id: &str, other: &str) -> AppResult<(i64, i64)> {
    let (Ok(id), Ok(other)) = (id.parse::<i64>(), other.parse::<i64>()) else {
        return Err(AppError::InvalidInput("Invalid ID".into()));
    };
    Ok((id, other))
}

async fn link_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, ticket_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (id, ticket_id) = parse_link_ids(&id, &ticket_id)?;
    app_state
        .attachment_use_cases
        .link_to_ticket(&user, id, ticket_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn unlink_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, ticket_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (id, ticket_id) = parse_link_ids(&id, &ticket_id)?;
    app_state
        .attachment_use_cases
        .unlink_from_ticket(&user, id, ticket_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn link_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (id, comment_id) = parse_link_ids(&id, &comment_id)?;
    app_state
        .attachment_use_cases
        .link_to_comment(&user, id, comment_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn unlink_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, comment_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (id, comment_id) = parse_link_ids(&id, &comment_id)?;
    app_state
        .attachment_use_cases
        .unlink_from_comment(&user, id, comment_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
