use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser},
    app_error::{AppError, AppResult},
    application::use_cases::comment::{CommentFilters, CreateComment, UpdateComment},
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{id}",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}

#[derive(Debug, Deserialize)]
struct ListCommentsParams {
    cursor: Option<String>,
    limit: Option<u32>,
    ticket_id: Option<String>,
    is_private: Option<String>,
}

impl ListCommentsParams {
    fn filters(&self) -> AppResult<CommentFilters> {
        let ticket_id = self
            .ticket_id
            .as_deref()
            .map(|raw| {
                raw.parse()
                    .map_err(|_| AppError::InvalidInput("Invalid ticket ID".into()))
            })
            .transpose()?;
        // Anything other than the two literals means "no filter".
        let is_private = match self.is_private.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        Ok(CommentFilters {
            ticket_id,
            is_private,
        })
    }
}

async fn list_comments(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListCommentsParams>,
) -> AppResult<impl IntoResponse> {
    let filters = params.filters()?;
    let page = app_state
        .comment_use_cases
        .list(
            &user,
            &filters,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "comment ID")?;
    let comment = app_state.comment_use_cases.get(&user, id).await?;
    Ok(Json(comment))
}

async fn create_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    let created = app_state.comment_use_cases.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateComment>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "comment ID")?;
    let updated = app_state
        .comment_use_cases
        .update(&user, id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_comment(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "comment ID")?;
    app_state.comment_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
