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
    app_error::AppResult,
    application::use_cases::user::{CreateUser, UpdateUser, UserFilters},
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
struct ListUsersParams {
    cursor: Option<String>,
    limit: Option<u32>,
    email: Option<String>,
    name: Option<String>,
}

async fn get_me(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(app_state.user_use_cases.me(&user)))
}

async fn list_users(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListUsersParams>,
) -> AppResult<impl IntoResponse> {
    let filters = UserFilters {
        email: params.email,
        name: params.name,
    };
    let page = app_state
        .user_use_cases
        .list(
            &user,
            &filters,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_user(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "user ID")?;
    let profile = app_state.user_use_cases.get(&user, id).await?;
    Ok(Json(profile))
}

async fn create_user(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let created = app_state.user_use_cases.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "user ID")?;
    let updated = app_state.user_use_cases.update(&user, id, payload).await?;
    Ok(Json(updated))
}

async fn delete_user(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "user ID")?;
    app_state.user_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
