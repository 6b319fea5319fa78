use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::application::use_cases::ticket::TicketRepo;
use crate::domain::entities::comment::{AuthorType, CommentProfile};
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<CommentProfile>>;
    async fn list(
        &self,
        organization_id: i64,
        filters: &CommentFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<CommentProfile>>;
    async fn create(&self, comment: &NewComment) -> AppResult<CommentProfile>;
    async fn update(&self, id: i64, changes: &CommentChanges) -> AppResult<Option<CommentProfile>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilters {
    pub ticket_id: Option<i64>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateComment {
    pub ticket_id: Option<i64>,
    pub body: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateComment {
    pub body: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: i64,
    pub body: String,
    pub body_html: String,
    pub is_private: bool,
    pub author_type: AuthorType,
    pub author_id: i64,
    pub organization_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Clone)]
pub struct CommentUseCases {
    repo: Arc<dyn CommentRepo>,
    ticket_repo: Arc<dyn TicketRepo>,
}

impl CommentUseCases {
    pub fn new(repo: Arc<dyn CommentRepo>, ticket_repo: Arc<dyn TicketRepo>) -> Self {
        Self { repo, ticket_repo }
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        filters: &CommentFilters,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<CommentProfile>> {
        let token = cursor.filter(|c| !c.is_empty());
        let after_id = token.and_then(decode_cursor).map(|p| p.id);
        let rows = self
            .repo
            .list(
                caller.organization_id(),
                filters,
                after_id,
                (page_size + 1) as i64,
            )
            .await?;
        Ok(paginate(rows, page_size, token.is_some(), |c| {
            CursorPosition::by_id(c.id())
        }))
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<CommentProfile> {
        self.get_owned(caller, id).await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(
        &self,
        caller: &UserProfile,
        input: CreateComment,
    ) -> AppResult<CommentProfile> {
        let Some(body) = input.body.filter(|b| !b.is_empty()) else {
            return Err(AppError::InvalidInput("Comment body is required".into()));
        };
        let Some(ticket_id) = input.ticket_id else {
            return Err(AppError::InvalidInput("Ticket ID is required".into()));
        };

        // The ticket goes through the same access pattern as a direct
        // fetch so a caller cannot comment on another tenant's ticket.
        let ticket = self
            .ticket_repo
            .get_by_id(ticket_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if ticket.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }

        let body_html = convert_to_html(&body);
        self.repo
            .create(&NewComment {
                ticket_id,
                body,
                body_html,
                is_private: input.is_private.unwrap_or(false),
                author_type: AuthorType::User,
                author_id: caller.id(),
                organization_id: caller.organization_id(),
            })
            .await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        input: UpdateComment,
    ) -> AppResult<CommentProfile> {
        let comment = self.get_owned(caller, id).await?;
        require_author(&comment, caller, "You can only update your own comments")?;

        let body_html = input.body.as_deref().map(convert_to_html);
        let changes = CommentChanges {
            body: input.body,
            body_html,
            is_private: input.is_private,
        };

        self.repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &UserProfile, id: i64) -> AppResult<()> {
        let comment = self.get_owned(caller, id).await?;
        require_author(&comment, caller, "You can only delete your own comments")?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<CommentProfile> {
        let comment = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if comment.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(comment)
    }
}

/// Only user-authored comments are locked to their author; anyone in the
/// organization may touch a contact-authored one.
fn require_author(comment: &CommentProfile, caller: &UserProfile, message: &str) -> AppResult<()> {
    if comment.comment.author_type == AuthorType::User && comment.comment.author_id != caller.id() {
        return Err(AppError::Forbidden(message.into()));
    }
    Ok(())
}

/// Escapes the body for safe HTML embedding and turns newlines into
/// `<br>` tags. The ampersand must go first.
pub fn convert_to_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
        .replace('\n', "<br>")
}
