use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::{PostgresPersistence, parse_json_with_fallback};
use crate::app_error::{AppError, AppResult};
use crate::application::cursor::CursorPosition;
use crate::application::use_cases::ticket::{NewTicket, TicketChanges, TicketFilters, TicketRepo};
use crate::domain::entities::ticket::{Ticket, TicketProfile};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> TicketProfile {
    let id: i64 = row.get("id");
    let assignee_json: serde_json::Value = row.get("assignee");
    let contact_json: serde_json::Value = row.get("contact");
    let attachments_json: serde_json::Value = row.get("attachments");
    TicketProfile {
        ticket: Ticket {
            id,
            subject: row.get("subject"),
            description: row.get("description"),
            status: row.get("status"),
            priority: row.get("priority"),
            assignee_id: row.get("assignee_id"),
            contact_id: row.get("contact_id"),
            organization_id: row.get("organization_id"),
            closed_at: row.get("closed_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        assignee: parse_json_with_fallback(&assignee_json, "assignee", "ticket", id),
        contact: parse_json_with_fallback(&contact_json, "contact", "ticket", id),
        attachments: parse_json_with_fallback(&attachments_json, "attachments", "ticket", id),
    }
}

// Assignee, contact and linked attachments come back as JSON columns so a
// page of tickets hydrates in a single query.
const SELECT_COLS: &str = r#"
    t.id, t.subject, t.description, t.status, t.priority,
    t.assignee_id, t.contact_id, t.organization_id,
    t.closed_at, t.created_at, t.updated_at,
    (
        SELECT json_build_object(
            'id', u.id, 'email', u.email, 'name', u.name,
            'organization_id', u.organization_id, 'role', u.role,
            'created_at', u.created_at, 'updated_at', u.updated_at
        )
        FROM users u WHERE u.id = t.assignee_id
    ) AS assignee,
    (
        SELECT json_build_object(
            'id', c.id, 'name', c.name, 'organization_id', c.organization_id,
            'created_at', c.created_at, 'updated_at', c.updated_at
        )
        FROM contacts c WHERE c.id = t.contact_id
    ) AS contact,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', a.id, 'file_name', a.file_name, 'content_type', a.content_type,
            'size', a.size, 'file_path', a.file_path,
            'organization_id', a.organization_id,
            'created_at', a.created_at, 'updated_at', a.updated_at
        ) ORDER BY a.id)
        FROM ticket_attachments ta
        JOIN attachments a ON a.id = ta.attachment_id
        WHERE ta.ticket_id = t.id
    ), '[]'::json) AS attachments
"#;

/// Pushes ticket filter conditions to a QueryBuilder.
/// Caller must ensure the builder already has base WHERE conditions.
/// Expects table alias `t` for tickets.
fn push_ticket_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &TicketFilters) {
    if let Some(status) = filters.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = filters.priority {
        builder.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(assignee_id) = filters.assignee_id {
        builder.push(" AND t.assignee_id = ").push_bind(assignee_id);
    }
    if let Some(contact_id) = filters.contact_id {
        builder.push(" AND t.contact_id = ").push_bind(contact_id);
    }
    if let Some(created_at_gt) = filters.created_at_gt {
        builder.push(" AND t.created_at > ").push_bind(created_at_gt);
    }
    if let Some(created_at_lt) = filters.created_at_lt {
        builder.push(" AND t.created_at < ").push_bind(created_at_lt);
    }
    if let Some(updated_at_gt) = filters.updated_at_gt {
        builder.push(" AND t.updated_at > ").push_bind(updated_at_gt);
    }
    if let Some(updated_at_lt) = filters.updated_at_lt {
        builder.push(" AND t.updated_at < ").push_bind(updated_at_lt);
    }
}

#[async_trait]
impl TicketRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TicketProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets t WHERE t.id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn list(
        &self,
        organization_id: i64,
        filters: &TicketFilters,
        cursor: Option<CursorPosition>,
        fetch: i64,
    ) -> AppResult<Vec<TicketProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM tickets t WHERE t.organization_id = ",
            SELECT_COLS
        ));
        builder.push_bind(organization_id);
        push_ticket_filters(&mut builder, filters);

        // Newest first; rows strictly after the cursor in (created_at, id)
        // descending order.
        if let Some(CursorPosition {
            id,
            created_at: Some(created_at),
        }) = cursor
        {
            builder.push(" AND (t.created_at < ").push_bind(created_at);
            builder.push(" OR (t.created_at = ").push_bind(created_at);
            builder.push(" AND t.id < ").push_bind(id);
            builder.push("))");
        }
        builder
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn create(&self, ticket: &NewTicket) -> AppResult<TicketProfile> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tickets (
                subject, description, status, priority,
                assignee_id, contact_id, organization_id, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(ticket.status)
        .bind(ticket.priority)
        .bind(ticket.assignee_id)
        .bind(ticket.contact_id)
        .bind(ticket.organization_id)
        .bind(ticket.closed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: i64, changes: &TicketChanges) -> AppResult<Option<TicketProfile>> {
        // assignee_id, contact_id and closed_at distinguish "leave untouched"
        // from "set NULL", so the SET list is built dynamically.
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE tickets SET updated_at = CURRENT_TIMESTAMP");
        if let Some(subject) = &changes.subject {
            builder.push(", subject = ").push_bind(subject);
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(status) = changes.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = changes.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(assignee_id) = changes.assignee_id {
            builder.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(contact_id) = changes.contact_id {
            builder.push(", contact_id = ").push_bind(contact_id);
        }
        if let Some(closed_at) = changes.closed_at {
            builder.push(", closed_at = ").push_bind(closed_at);
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
