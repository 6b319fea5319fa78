use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser},
    app_error::{AppError, AppResult},
    application::use_cases::team::{AddTeamMember, CreateTeam, UpdateTeam},
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route(
            "/{id}",
            get(get_team).patch(update_team).delete(delete_team),
        )
        .route("/{id}/members", post(add_member))
        .route("/{id}/members/{user_id}", delete(remove_member))
}

#[derive(Debug, Deserialize)]
struct ListTeamsParams {
    cursor: Option<String>,
    limit: Option<u32>,
}

async fn list_teams(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListTeamsParams>,
) -> AppResult<impl IntoResponse> {
    let page = app_state
        .team_use_cases
        .list(
            &user,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_team(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "team ID")?;
    let team = app_state.team_use_cases.get(&user, id).await?;
    Ok(Json(team))
}

async fn create_team(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTeam>,
) -> AppResult<impl IntoResponse> {
    let created = app_state.team_use_cases.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_team(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeam>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "team ID")?;
    let updated = app_state.team_use_cases.update(&user, id, payload).await?;
    Ok(Json(updated))
}

async fn delete_team(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "team ID")?;
    app_state.team_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn add_member(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<AddTeamMember>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "team ID")?;
    app_state.team_use_cases.add_member(&user, id, payload).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn remove_member(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (Ok(id), Ok(user_id)) = (id.parse::<i64>(), user_id.parse::<i64>()) else {
        return Err(AppError::InvalidInput("Invalid team ID or user ID".into()));
    };
    app_state
        .team_use_cases
        .remove_member(&user, id, user_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
