use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::{PostgresPersistence, parse_json_with_fallback};
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::team::{TeamRepo, UpdateTeam};
use crate::domain::entities::team::{Team, TeamProfile};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> TeamProfile {
    let id: i64 = row.get("id");
    let members_json: serde_json::Value = row.get("members");
    TeamProfile {
        team: Team {
            id,
            name: row.get("name"),
            organization_id: row.get("organization_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        members: parse_json_with_fallback(&members_json, "members", "team", id),
    }
}

// Members are hydrated in one pass as a JSON array, ordered by user id.
const SELECT_COLS: &str = r#"
    t.id, t.name, t.organization_id, t.created_at, t.updated_at,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', u.id, 'email', u.email, 'name', u.name,
            'organization_id', u.organization_id, 'role', u.role,
            'created_at', u.created_at, 'updated_at', u.updated_at
        ) ORDER BY u.id)
        FROM team_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE tm.team_id = t.id
    ), '[]'::json) AS members
"#;

#[async_trait]
impl TeamRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TeamProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM teams t WHERE t.id = $1",
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
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<TeamProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM teams t WHERE t.organization_id = ",
            SELECT_COLS
        ));
        builder.push_bind(organization_id);
        if let Some(after_id) = after_id {
            builder.push(" AND t.id > ").push_bind(after_id);
        }
        builder.push(" ORDER BY t.id ASC LIMIT ").push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn create(&self, organization_id: i64, name: &str) -> AppResult<TeamProfile> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO teams (organization_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(organization_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: i64, changes: &UpdateTeam) -> AppResult<Option<TeamProfile>> {
        let result = sqlx::query(
            r#"
            UPDATE teams SET
                name = COALESCE($2, name),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_member(&self, team_id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_member(&self, team_id: i64, user_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
