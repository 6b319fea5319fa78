use async_trait::async_trait;
use sqlx::Row;

use crate::adapters::persistence::PostgresPersistence;
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::organization::{OrganizationRepo, UpdateOrganization};
use crate::domain::entities::organization::Organization;

fn row_to_organization(row: &sqlx::postgres::PgRow) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = "id, name, slug, created_at, updated_at";

#[async_trait]
impl OrganizationRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Organization>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_organization))
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateOrganization,
    ) -> AppResult<Option<Organization>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE organizations SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_organization))
    }
}
