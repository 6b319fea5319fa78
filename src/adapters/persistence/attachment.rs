use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::PostgresPersistence;
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::attachment::{AttachmentRepo, NewAttachment};
use crate::domain::entities::attachment::Attachment;

fn row_to_attachment(row: &sqlx::postgres::PgRow) -> Attachment {
    Attachment {
        id: row.get("id"),
        file_name: row.get("file_name"),
        content_type: row.get("content_type"),
        size: row.get("size"),
        file_path: row.get("file_path"),
        organization_id: row.get("organization_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str =
    "id, file_name, content_type, size, file_path, organization_id, created_at, updated_at";

#[async_trait]
impl AttachmentRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Attachment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM attachments WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_attachment))
    }

    async fn list(
        &self,
        organization_id: i64,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<Attachment>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM attachments WHERE organization_id = ",
            SELECT_COLS
        ));
        builder.push_bind(organization_id);
        if let Some(after_id) = after_id {
            builder.push(" AND id > ").push_bind(after_id);
        }
        builder.push(" ORDER BY id ASC LIMIT ").push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_attachment).collect())
    }

    async fn create(&self, organization_id: i64, meta: &NewAttachment) -> AppResult<Attachment> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO attachments (file_name, content_type, size, file_path, organization_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(&meta.file_name)
        .bind(&meta.content_type)
        .bind(meta.size)
        .bind(&meta.file_path)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_attachment(&row))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_to_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO ticket_attachments (ticket_id, attachment_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(ticket_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn unlink_from_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM ticket_attachments WHERE ticket_id = $1 AND attachment_id = $2",
        )
        .bind(ticket_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_to_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO comment_attachments (comment_id, attachment_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(comment_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn unlink_from_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM comment_attachments WHERE comment_id = $1 AND attachment_id = $2",
        )
        .bind(comment_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
