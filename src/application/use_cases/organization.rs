use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::Page;
use crate::domain::entities::organization::Organization;
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait OrganizationRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Organization>>;
    async fn update(&self, id: i64, changes: &UpdateOrganization) -> AppResult<Option<Organization>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Clone)]
pub struct OrganizationUseCases {
    repo: Arc<dyn OrganizationRepo>,
}

impl OrganizationUseCases {
    pub fn new(repo: Arc<dyn OrganizationRepo>) -> Self {
        Self { repo }
    }

    /// Listing organizations only ever yields the caller's own, wrapped
    /// in the standard envelope with no cursors.
    #[instrument(skip(self, caller))]
    pub async fn list(&self, caller: &UserProfile) -> AppResult<Page<Organization>> {
        let organization = self
            .repo
            .get_by_id(caller.organization_id())
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(Page {
            data: vec![organization],
            next_cursor: String::new(),
            prev_cursor: String::new(),
        })
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<Organization> {
        if caller.organization_id() != id {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, caller, changes))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        changes: UpdateOrganization,
    ) -> AppResult<Organization> {
        if caller.organization_id() != id {
            return Err(AppError::Forbidden("Access denied".into()));
        }

        match self.repo.update(id, &changes).await {
            Ok(Some(organization)) => Ok(organization),
            Ok(None) => Err(AppError::NotFound),
            Err(AppError::Conflict(_)) => Err(AppError::Conflict(
                "Organization with this slug already exists".into(),
            )),
            Err(err) => Err(err),
        }
    }
}
