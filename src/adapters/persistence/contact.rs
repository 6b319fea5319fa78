use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{QueryBuilder, Row};

use crate::adapters::persistence::{PostgresPersistence, parse_json_with_fallback};
use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::contact::{
    ContactChanges, ContactFilters, ContactRepo, NewEmail, NewPhone,
};
use crate::domain::entities::contact::{Contact, ContactProfile};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> ContactProfile {
    let id: i64 = row.get("id");
    let emails_json: serde_json::Value = row.get("emails");
    let phones_json: serde_json::Value = row.get("phones");
    ContactProfile {
        contact: Contact {
            id,
            name: row.get("name"),
            organization_id: row.get("organization_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
        emails: parse_json_with_fallback(&emails_json, "emails", "contact", id),
        phones: parse_json_with_fallback(&phones_json, "phones", "contact", id),
    }
}

const SELECT_COLS: &str = r#"
    c.id, c.name, c.organization_id, c.created_at, c.updated_at,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', ce.id, 'contact_id', ce.contact_id,
            'email', ce.email, 'is_primary', ce.is_primary
        ) ORDER BY ce.id)
        FROM contact_emails ce WHERE ce.contact_id = c.id
    ), '[]'::json) AS emails,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', cp.id, 'contact_id', cp.contact_id,
            'phone', cp.phone, 'is_primary', cp.is_primary
        ) ORDER BY cp.id)
        FROM contact_phones cp WHERE cp.contact_id = c.id
    ), '[]'::json) AS phones
"#;

/// Pushes contact filter conditions to a QueryBuilder.
/// Caller must ensure the builder already has base WHERE conditions.
/// Expects table alias `c` for contacts.
fn push_contact_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &ContactFilters) {
    if let Some(name) = &filters.name {
        builder
            .push(" AND c.name ILIKE ")
            .push_bind(format!("%{}%", name));
    }
    if let Some(email) = &filters.email {
        builder
            .push(" AND EXISTS (SELECT 1 FROM contact_emails ce WHERE ce.contact_id = c.id AND ce.email ILIKE ")
            .push_bind(format!("%{}%", email));
        builder.push(")");
    }
    if let Some(phone) = &filters.phone {
        builder
            .push(" AND EXISTS (SELECT 1 FROM contact_phones cp WHERE cp.contact_id = c.id AND cp.phone ILIKE ")
            .push_bind(format!("%{}%", phone));
        builder.push(")");
    }
}

impl PostgresPersistence {
    async fn insert_contact_identifiers(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        contact_id: i64,
        emails: &[NewEmail],
        phones: &[NewPhone],
    ) -> AppResult<()> {
        for email in emails {
            sqlx::query(
                "INSERT INTO contact_emails (contact_id, email, is_primary) VALUES ($1, $2, $3)",
            )
            .bind(contact_id)
            .bind(&email.email)
            .bind(email.is_primary)
            .execute(&mut **tx)
            .await
            .map_err(AppError::from)?;
        }
        for phone in phones {
            sqlx::query(
                "INSERT INTO contact_phones (contact_id, phone, is_primary) VALUES ($1, $2, $3)",
            )
            .bind(contact_id)
            .bind(&phone.phone)
            .bind(phone.is_primary)
            .execute(&mut **tx)
            .await
            .map_err(AppError::from)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<ContactProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contacts c WHERE c.id = $1",
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
        filters: &ContactFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<ContactProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM contacts c WHERE c.organization_id = ",
            SELECT_COLS
        ));
        builder.push_bind(organization_id);
        push_contact_filters(&mut builder, filters);
        if let Some(after_id) = after_id {
            builder.push(" AND c.id > ").push_bind(after_id);
        }
        builder.push(" ORDER BY c.id ASC LIMIT ").push_bind(fetch);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_profile).collect())
    }

    async fn find_existing(
        &self,
        organization_id: i64,
        emails: &[String],
        phones: &[String],
    ) -> AppResult<Option<ContactProfile>> {
        // Empty arrays never match: ANY on an empty array is false.
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM contacts c
            WHERE c.organization_id = $1
              AND (
                EXISTS (
                    SELECT 1 FROM contact_emails ce
                    WHERE ce.contact_id = c.id AND ce.email = ANY($2)
                )
                OR EXISTS (
                    SELECT 1 FROM contact_phones cp
                    WHERE cp.contact_id = c.id AND cp.phone = ANY($3)
                )
              )
            ORDER BY c.id ASC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(organization_id)
        .bind(emails)
        .bind(phones)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn create(
        &self,
        organization_id: i64,
        name: &str,
        emails: &[NewEmail],
        phones: &[NewPhone],
    ) -> AppResult<ContactProfile> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO contacts (organization_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(organization_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        Self::insert_contact_identifiers(&mut tx, id, emails, phones).await?;

        tx.commit().await.map_err(AppError::from)?;
        self.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    async fn update(&self, id: i64, changes: &ContactChanges) -> AppResult<Option<ContactProfile>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE contacts SET
                name = COALESCE($2, name),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        // A provided collection replaces the stored one wholesale.
        if let Some(emails) = &changes.emails {
            sqlx::query("DELETE FROM contact_emails WHERE contact_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
            Self::insert_contact_identifiers(&mut tx, id, emails, &[]).await?;
        }
        if let Some(phones) = &changes.phones {
            sqlx::query("DELETE FROM contact_phones WHERE contact_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
            Self::insert_contact_identifiers(&mut tx, id, &[], phones).await?;
        }

        tx.commit().await.map_err(AppError::from)?;
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
