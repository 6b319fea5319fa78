use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::application::use_cases::comment::CommentRepo;
use crate::application::use_cases::ticket::TicketRepo;
use crate::domain::entities::attachment::Attachment;
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait AttachmentRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Attachment>>;
    async fn list(
        &self,
        organization_id: i64,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<Attachment>>;
    async fn create(&self, organization_id: i64, meta: &NewAttachment) -> AppResult<Attachment>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Returns false when the link already exists.
    async fn link_to_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool>;
    /// Returns false when there was no link to remove.
    async fn unlink_from_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool>;
    async fn link_to_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool>;
    async fn unlink_from_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAttachment {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<i64>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub file_path: String,
}

/// Attachment metadata management. The bytes live in an external store;
/// this only tracks descriptors and their links to tickets and comments.
#[derive(Clone)]
pub struct AttachmentUseCases {
    repo: Arc<dyn AttachmentRepo>,
    ticket_repo: Arc<dyn TicketRepo>,
    comment_repo: Arc<dyn CommentRepo>,
}

impl AttachmentUseCases {
    pub fn new(
        repo: Arc<dyn AttachmentRepo>,
        ticket_repo: Arc<dyn TicketRepo>,
        comment_repo: Arc<dyn CommentRepo>,
    ) -> Self {
        Self {
            repo,
            ticket_repo,
            comment_repo,
        }
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<Attachment>> {
        let token = cursor.filter(|c| !c.is_empty());
        let after_id = token.and_then(decode_cursor).map(|p| p.id);
        let rows = self
            .repo
            .list(caller.organization_id(), after_id, (page_size + 1) as i64)
            .await?;
        Ok(paginate(rows, page_size, token.is_some(), |a| {
            CursorPosition::by_id(a.id)
        }))
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<Attachment> {
        self.get_owned(caller, id).await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(
        &self,
        caller: &UserProfile,
        input: CreateAttachment,
    ) -> AppResult<Attachment> {
        let (Some(file_name), Some(content_type), Some(size), Some(file_path)) = (
            input.file_name.filter(|s| !s.is_empty()),
            input.content_type.filter(|s| !s.is_empty()),
            input.size,
            input.file_path.filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::InvalidInput(
                "file_name, content_type, size, and file_path are required".into(),
            ));
        };

        self.repo
            .create(
                caller.organization_id(),
                &NewAttachment {
                    file_name,
                    content_type,
                    size,
                    file_path,
                },
            )
            .await
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &UserProfile, id: i64) -> AppResult<()> {
        self.get_owned(caller, id).await?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn link_to_ticket(
        &self,
        caller: &UserProfile,
        id: i64,
        ticket_id: i64,
    ) -> AppResult<()> {
        self.get_owned(caller, id).await?;
        self.get_owned_ticket(caller, ticket_id).await?;

        if !self.repo.link_to_ticket(id, ticket_id).await? {
            return Err(AppError::Conflict(
                "Attachment already linked to this ticket".into(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn unlink_from_ticket(
        &self,
        caller: &UserProfile,
        id: i64,
        ticket_id: i64,
    ) -> AppResult<()> {
        self.get_owned(caller, id).await?;
        self.get_owned_ticket(caller, ticket_id).await?;

        if !self.repo.unlink_from_ticket(id, ticket_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn link_to_comment(
        &self,
        caller: &UserProfile,
        id: i64,
        comment_id: i64,
    ) -> AppResult<()> {
        self.get_owned(caller, id).await?;
        self.get_owned_comment(caller, comment_id).await?;

        if !self.repo.link_to_comment(id, comment_id).await? {
            return Err(AppError::Conflict(
                "Attachment already linked to this comment".into(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn unlink_from_comment(
        &self,
        caller: &UserProfile,
        id: i64,
        comment_id: i64,
    ) -> AppResult<()> {
        self.get_owned(caller, id).await?;
        self.get_owned_comment(caller, comment_id).await?;

        if !self.repo.unlink_from_comment(id, comment_id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<Attachment> {
        let attachment = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if attachment.organization_id != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(attachment)
    }

    async fn get_owned_ticket(&self, caller: &UserProfile, ticket_id: i64) -> AppResult<()> {
        let ticket = self
            .ticket_repo
            .get_by_id(ticket_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if ticket.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(())
    }

    async fn get_owned_comment(&self, caller: &UserProfile, comment_id: i64) -> AppResult<()> {
        let comment = self
            .comment_repo
            .get_by_id(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if comment.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(())
    }
}
