use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::PostgresPersistence;
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::user::{UserChanges, UserFilters, UserRepo};
use crate::domain::entities::organization::Organization;
use crate::domain::entities::user::{User, UserProfile, UserRole};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> UserProfile {
    UserProfile {
        user: User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            organization_id: row.get("organization_id"),
            role: row.get("role"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        organization: Organization {
            id: row.get("org_id"),
            name: row.get("org_name"),
            slug: row.get("org_slug"),
            created_at: row.get("org_created_at"),
            updated_at: row.get("org_updated_at"),
        },
    }
}

const SELECT_COLS: &str = r#"
    u.id, u.email, u.name, u.organization_id, u.role, u.created_at, u.updated_at,
    o.id AS org_id, o.name AS org_name, o.slug AS org_slug,
    o.created_at AS org_created_at, o.updated_at AS org_updated_at
"#;

const FROM_JOINED: &str = "FROM users u JOIN organizations o ON o.id = u.organization_id";

/// Pushes user filter conditions to a QueryBuilder.
/// Caller must ensure the builder already has base WHERE conditions.
/// Expects table alias `u` for users.
fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &UserFilters) {
    if let Some(email) = &filters.email {
        builder
            .push(" AND u.email ILIKE ")
            .push_bind(format!("%{}%", email));
    }
    if let Some(name) = &filters.name {
        builder
            .push(" AND u.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} {} WHERE u.id = $1",
            SELECT_COLS, FROM_JOINED
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
        filters: &UserFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<UserProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} {} WHERE u.organization_id = ",
            SELECT_COLS, FROM_JOINED
        ));
        builder.push_bind(organization_id);
        push_user_filters(&mut builder, filters);
        if let Some(after_id) = after_id {
            builder.push(" AND u.id > ").push_bind(after_id);
        }
        builder.push(" ORDER BY u.id ASC LIMIT ").push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn create(
        &self,
        organization_id: i64,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> AppResult<UserProfile> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (organization_id, email, name, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(organization_id)
        .bind(email)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> AppResult<Option<UserProfile>> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                role = COALESCE($4, role),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.name)
        .bind(changes.role)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
