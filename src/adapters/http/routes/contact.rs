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
    application::use_cases::contact::{ContactFilters, CreateContact, UpdateContact},
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/{id}",
            get(get_contact).patch(update_contact).delete(delete_contact),
        )
}

#[derive(Debug, Deserialize)]
struct ListContactsParams {
    cursor: Option<String>,
    limit: Option<u32>,
    email: Option<String>,
    phone: Option<String>,
    name: Option<String>,
}

async fn list_contacts(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListContactsParams>,
) -> AppResult<impl IntoResponse> {
    let filters = ContactFilters {
        email: params.email,
        phone: params.phone,
        name: params.name,
    };
    let page = app_state
        .contact_use_cases
        .list(
            &user,
            &filters,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_contact(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "contact ID")?;
    let contact = app_state.contact_use_cases.get(&user, id).await?;
    Ok(Json(contact))
}

/// Creation is a smart merge: when a supplied identifier already belongs
/// to a contact in the organization, that contact is updated in place.
/// Either outcome responds 201 with the hydrated contact.
async fn create_contact(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateContact>,
) -> AppResult<impl IntoResponse> {
    let contact = app_state
        .contact_use_cases
        .create_or_merge(&user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update_contact(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateContact>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "contact ID")?;
    let contact = app_state
        .contact_use_cases
        .update(&user, id, payload)
        .await?;
    Ok(Json(contact))
}

async fn delete_contact(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "contact ID")?;
    app_state.contact_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
