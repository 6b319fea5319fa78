use async_trait::async_trait;
use sqlx::Row;

use crate::adapters::persistence::PostgresPersistence;
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::auth::ApiKeyRepo;
use crate::domain::entities::api_key::ApiKey;

fn row_to_api_key(row: &sqlx::postgres::PgRow) -> ApiKey {
    ApiKey {
        id: row.get("id"),
        key_hash: row.get("key_hash"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        last_used_at: row.get("last_used_at"),
    }
}

const SELECT_COLS: &str = "id, key_hash, user_id, created_at, last_used_at";

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn create(&self, user_id: i64, key_hash: &str) -> AppResult<ApiKey> {
        let row = sqlx::query(&format!(
            "INSERT INTO api_keys (user_id, key_hash) VALUES ($1, $2) RETURNING {}",
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(key_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_api_key(&row))
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM api_keys WHERE key_hash = $1",
            SELECT_COLS
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_api_key))
    }

    async fn touch_last_used(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
