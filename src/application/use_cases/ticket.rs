use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::application::use_cases::contact::ContactRepo;
use crate::application::use_cases::user::UserRepo;
use crate::domain::entities::ticket::{TicketPriority, TicketProfile, TicketStatus};
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait TicketRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TicketProfile>>;
    /// Rows come back ordered `created_at DESC, id DESC`; the cursor
    /// position selects rows strictly after it in that order.
    async fn list(
        &self,
        organization_id: i64,
        filters: &TicketFilters,
        cursor: Option<CursorPosition>,
        fetch: i64,
    ) -> AppResult<Vec<TicketProfile>>;
    async fn create(&self, ticket: &NewTicket) -> AppResult<TicketProfile>;
    async fn update(&self, id: i64, changes: &TicketChanges) -> AppResult<Option<TicketProfile>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilters {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub created_at_gt: Option<DateTime<Utc>>,
    pub created_at_lt: Option<DateTime<Utc>>,
    pub updated_at_gt: Option<DateTime<Utc>>,
    pub updated_at_lt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTicket {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<i64>,
    pub contact_id: Option<i64>,
}

/// `assignee_id` and `contact_id` distinguish "absent" (leave as is)
/// from an explicit `null` (unassign).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicket {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub assignee_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub contact_id: Option<Option<i64>>,
}

fn some_if_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub subject: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assignee_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub organization_id: i64,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Validated field updates. Outer `None` leaves a column untouched;
/// inner `None` writes NULL.
#[derive(Debug, Clone, Default)]
pub struct TicketChanges {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assignee_id: Option<Option<i64>>,
    pub contact_id: Option<Option<i64>>,
    pub closed_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Clone)]
pub struct TicketUseCases {
    repo: Arc<dyn TicketRepo>,
    user_repo: Arc<dyn UserRepo>,
    contact_repo: Arc<dyn ContactRepo>,
}

impl TicketUseCases {
    pub fn new(
        repo: Arc<dyn TicketRepo>,
        user_repo: Arc<dyn UserRepo>,
        contact_repo: Arc<dyn ContactRepo>,
    ) -> Self {
        Self {
            repo,
            user_repo,
            contact_repo,
        }
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        filters: &TicketFilters,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<TicketProfile>> {
        self.validate_references(caller, filters.assignee_id, filters.contact_id)
            .await?;

        let token = cursor.filter(|c| !c.is_empty());
        // Tickets paginate on a compound position; a token without a
        // timestamp cannot be one of ours, so it restarts the listing.
        let position = token
            .and_then(decode_cursor)
            .filter(|p| p.created_at.is_some());
        let rows = self
            .repo
            .list(
                caller.organization_id(),
                filters,
                position,
                (page_size + 1) as i64,
            )
            .await?;
        Ok(paginate(rows, page_size, token.is_some(), |t| {
            CursorPosition::by_created_at(t.id(), t.ticket.created_at)
        }))
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<TicketProfile> {
        self.get_owned(caller, id).await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(&self, caller: &UserProfile, input: CreateTicket) -> AppResult<TicketProfile> {
        let Some(subject) = input.subject.filter(|s| !s.is_empty()) else {
            return Err(AppError::InvalidInput("Subject is required".into()));
        };

        let status = match input.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => TicketStatus::Open,
        };
        let priority = match input.priority.as_deref() {
            Some(raw) => parse_priority(raw)?,
            None => TicketPriority::Normal,
        };

        self.validate_references(caller, input.assignee_id, input.contact_id)
            .await?;

        let closed_at = (status == TicketStatus::Closed).then(Utc::now);
        self.repo
            .create(&NewTicket {
                subject,
                description: input.description,
                status,
                priority,
                assignee_id: input.assignee_id,
                contact_id: input.contact_id,
                organization_id: caller.organization_id(),
                closed_at,
            })
            .await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        input: UpdateTicket,
    ) -> AppResult<TicketProfile> {
        self.get_owned(caller, id).await?;

        let status = input.status.as_deref().map(parse_status).transpose()?;
        let priority = input.priority.as_deref().map(parse_priority).transpose()?;

        self.validate_references(
            caller,
            input.assignee_id.flatten(),
            input.contact_id.flatten(),
        )
        .await?;

        // Closing stamps the close time; reopening clears it.
        let closed_at = match status {
            Some(TicketStatus::Closed) => Some(Some(Utc::now())),
            Some(TicketStatus::Open) => Some(None),
            None => None,
        };

        let changes = TicketChanges {
            subject: input.subject,
            description: input.description,
            status,
            priority,
            assignee_id: input.assignee_id,
            contact_id: input.contact_id,
            closed_at,
        };

        self.repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &UserProfile, id: i64) -> AppResult<()> {
        self.get_owned(caller, id).await?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<TicketProfile> {
        let ticket = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if ticket.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(ticket)
    }

    /// Assignee and contact references must point inside the caller's
    /// organization; anything else reads as an invalid input, not a leak
    /// of the other tenant's data.
    async fn validate_references(
        &self,
        caller: &UserProfile,
        assignee_id: Option<i64>,
        contact_id: Option<i64>,
    ) -> AppResult<()> {
        if let Some(assignee_id) = assignee_id {
            let valid = self
                .user_repo
                .get_by_id(assignee_id)
                .await?
                .is_some_and(|u| u.organization_id() == caller.organization_id());
            if !valid {
                return Err(AppError::InvalidInput("Invalid assignee".into()));
            }
        }

        if let Some(contact_id) = contact_id {
            let valid = self
                .contact_repo
                .get_by_id(contact_id)
                .await?
                .is_some_and(|c| c.organization_id() == caller.organization_id());
            if !valid {
                return Err(AppError::InvalidInput("Invalid contact".into()));
            }
        }

        Ok(())
    }
}

pub fn parse_status(raw: &str) -> AppResult<TicketStatus> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput("Invalid status value".into()))
}

pub fn parse_priority(raw: &str) -> AppResult<TicketPriority> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput("Invalid priority value".into()))
}
