use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser},
    app_error::AppResult,
    application::use_cases::organization::UpdateOrganization,
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_organizations))
        .route("/{id}", get(get_organization).patch(update_organization))
}

async fn list_organizations(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let page = app_state.organization_use_cases.list(&user).await?;
    Ok(Json(page))
}

async fn get_organization(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "organization ID")?;
    let organization = app_state.organization_use_cases.get(&user, id).await?;
    Ok(Json(organization))
}

async fn update_organization(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrganization>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "organization ID")?;
    let organization = app_state
        .organization_use_cases
        .update(&user, id, payload)
        .await?;
    Ok(Json(organization))
}
