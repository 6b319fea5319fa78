use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::{PostgresPersistence, parse_json_with_fallback};
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::comment::{
    CommentChanges, CommentFilters, CommentRepo, NewComment,
};
use crate::domain::entities::comment::{Comment, CommentProfile};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> CommentProfile {
    let id: i64 = row.get("id");
    let author_json: serde_json::Value = row.get("author");
    let attachments_json: serde_json::Value = row.get("attachments");
    CommentProfile {
        comment: Comment {
            id,
            ticket_id: row.get("ticket_id"),
            body: row.get("body"),
            body_html: row.get("body_html"),
            is_private: row.get("is_private"),
            author_type: row.get("author_type"),
            author_id: row.get("author_id"),
            organization_id: row.get("organization_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        author: parse_json_with_fallback(&author_json, "author", "comment", id),
        attachments: parse_json_with_fallback(&attachments_json, "attachments", "comment", id),
    }
}

// The author column resolves against users or contacts depending on
// author_type; a dangling author_id hydrates as NULL.
const SELECT_COLS: &str = r#"
    cm.id, cm.ticket_id, cm.body, cm.body_html, cm.is_private,
    cm.author_type, cm.author_id, cm.organization_id,
    cm.created_at, cm.updated_at,
    CASE cm.author_type
        WHEN 'user' THEN (
            SELECT json_build_object(
                'id', u.id, 'email', u.email, 'name', u.name,
                'organization_id', u.organization_id, 'role', u.role,
                'created_at', u.created_at, 'updated_at', u.updated_at
            )
            FROM users u WHERE u.id = cm.author_id
        )
        ELSE (
            SELECT json_build_object(
                'id', c.id, 'name', c.name, 'organization_id', c.organization_id,
                'created_at', c.created_at, 'updated_at', c.updated_at
            )
            FROM contacts c WHERE c.id = cm.author_id
        )
    END AS author,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', a.id, 'file_name', a.file_name, 'content_type', a.content_type,
            'size', a.size, 'file_path', a.file_path,
            'organization_id', a.organization_id,
            'created_at', a.created_at, 'updated_at', a.updated_at
        ) ORDER BY a.id)
        FROM comment_attachments ca
        JOIN attachments a ON a.id = ca.attachment_id
        WHERE ca.comment_id = cm.id
    ), '[]'::json) AS attachments
"#;

/// Pushes comment filter conditions to a QueryBuilder.
/// Caller must ensure the builder already has base WHERE conditions.
/// Expects table alias `cm` for comments.
fn push_comment_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &CommentFilters) {
    if let Some(ticket_id) = filters.ticket_id {
        builder.push(" AND cm.ticket_id = ").push_bind(ticket_id);
    }
    if let Some(is_private) = filters.is_private {
        builder.push(" AND cm.is_private = ").push_bind(is_private);
    }
}

#[async_trait]
impl CommentRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<CommentProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM comments cm WHERE cm.id = $1",
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
        filters: &CommentFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<CommentProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM comments cm WHERE cm.organization_id = ",
            SELECT_COLS
        ));
        builder.push_bind(organization_id);
        push_comment_filters(&mut builder, filters);
        if let Some(after_id) = after_id {
            builder.push(" AND cm.id > ").push_bind(after_id);
        }
        builder.push(" ORDER BY cm.id ASC LIMIT ").push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn create(&self, comment: &NewComment) -> AppResult<CommentProfile> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (
                ticket_id, body, body_html, is_private,
                author_type, author_id, organization_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(comment.ticket_id)
        .bind(&comment.body)
        .bind(&comment.body_html)
        .bind(comment.is_private)
        .bind(comment.author_type)
        .bind(comment.author_id)
        .bind(comment.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: i64, changes: &CommentChanges) -> AppResult<Option<CommentProfile>> {
        let result = sqlx::query(
            r#"
            UPDATE comments SET
                body = COALESCE($2, body),
                body_html = COALESCE($3, body_html),
                is_private = COALESCE($4, is_private),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.body)
        .bind(&changes.body_html)
        .bind(changes.is_private)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
