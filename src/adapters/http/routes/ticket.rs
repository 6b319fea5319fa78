use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser},
    app_error::{AppError, AppResult},
    application::{
        use_cases::ticket::{
            CreateTicket, TicketFilters, UpdateTicket, parse_priority, parse_status,
        },
        validators::parse_date_filter,
    },
};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route(
            "/{id}",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
}

#[derive(Debug, Deserialize)]
struct ListTicketsParams {
    cursor: Option<String>,
    limit: Option<u32>,
    status: Option<String>,
    priority: Option<String>,
    assignee_id: Option<String>,
    contact_id: Option<String>,
    created_at_gt: Option<String>,
    created_at_lt: Option<String>,
    updated_at_gt: Option<String>,
    updated_at_lt: Option<String>,
}

impl ListTicketsParams {
    fn filters(&self) -> AppResult<TicketFilters> {
        Ok(TicketFilters {
            status: self.status.as_deref().map(parse_status).transpose()?,
            priority: self.priority.as_deref().map(parse_priority).transpose()?,
            assignee_id: parse_filter_id(self.assignee_id.as_deref(), "assignee")?,
            contact_id: parse_filter_id(self.contact_id.as_deref(), "contact")?,
            created_at_gt: parse_filter_date(self.created_at_gt.as_deref(), "created_at_gt")?,
            created_at_lt: parse_filter_date(self.created_at_lt.as_deref(), "created_at_lt")?,
            updated_at_gt: parse_filter_date(self.updated_at_gt.as_deref(), "updated_at_gt")?,
            updated_at_lt: parse_filter_date(self.updated_at_lt.as_deref(), "updated_at_lt")?,
        })
    }
}

fn parse_filter_id(raw: Option<&str>, label: &str) -> AppResult<Option<i64>> {
    raw.map(|raw| {
        raw.parse()
            .map_err(|_| AppError::InvalidInput(format!("Invalid {label} ID")))
    })
    .transpose()
}

fn parse_filter_date(raw: Option<&str>, field: &str) -> AppResult<Option<DateTime<Utc>>> {
    raw.map(|raw| {
        parse_date_filter(raw).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Invalid {field} format. Use ISO 8601 format (e.g., 2024-03-20T10:30:00Z)"
            ))
        })
    })
    .transpose()
}

async fn list_tickets(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListTicketsParams>,
) -> AppResult<impl IntoResponse> {
    let filters = params.filters()?;
    let page = app_state
        .ticket_use_cases
        .list(
            &user,
            &filters,
            params.cursor.as_deref(),
            app_state.page_size(params.limit),
        )
        .await?;
    Ok(Json(page))
}

async fn get_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "ticket ID")?;
    let ticket = app_state.ticket_use_cases.get(&user, id).await?;
    Ok(Json(ticket))
}

async fn create_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTicket>,
) -> AppResult<impl IntoResponse> {
    let created = app_state.ticket_use_cases.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicket>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "ticket ID")?;
    let updated = app_state
        .ticket_use_cases
        .update(&user, id, payload)
        .await?;
    Ok(Json(updated))
}

async fn delete_ticket(
    State(app_state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id, "ticket ID")?;
    app_state.ticket_use_cases.delete(&user, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
