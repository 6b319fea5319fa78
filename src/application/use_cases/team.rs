use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::application::use_cases::user::UserRepo;
use crate::domain::entities::team::TeamProfile;
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait TeamRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TeamProfile>>;
    async fn list(
        &self,
        organization_id: i64,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<TeamProfile>>;
    async fn create(&self, organization_id: i64, name: &str) -> AppResult<TeamProfile>;
    async fn update(&self, id: i64, changes: &UpdateTeam) -> AppResult<Option<TeamProfile>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Returns false when the membership row could not be inserted, e.g.
    /// because it already exists.
    async fn add_member(&self, team_id: i64, user_id: i64) -> AppResult<bool>;
    async fn remove_member(&self, team_id: i64, user_id: i64) -> AppResult<bool>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTeam {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTeam {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddTeamMember {
    pub user_id: Option<i64>,
}

/// Team management. Reads are open to the whole organization; every
/// mutation is admin-only.
#[derive(Clone)]
pub struct TeamUseCases {
    repo: Arc<dyn TeamRepo>,
    user_repo: Arc<dyn UserRepo>,
}

impl TeamUseCases {
    pub fn new(repo: Arc<dyn TeamRepo>, user_repo: Arc<dyn UserRepo>) -> Self {
        Self { repo, user_repo }
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<TeamProfile>> {
        let token = cursor.filter(|c| !c.is_empty());
        let after_id = token.and_then(decode_cursor).map(|p| p.id);
        let rows = self
            .repo
            .list(caller.organization_id(), after_id, (page_size + 1) as i64)
            .await?;
        Ok(paginate(rows, page_size, token.is_some(), |t| {
            CursorPosition::by_id(t.id())
        }))
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<TeamProfile> {
        self.get_owned(caller, id).await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(&self, caller: &UserProfile, input: CreateTeam) -> AppResult<TeamProfile> {
        require_admin(caller, "Only admins can create teams")?;

        let Some(name) = input.name.filter(|n| !n.is_empty()) else {
            return Err(AppError::InvalidInput("Name is required".into()));
        };

        match self.repo.create(caller.organization_id(), &name).await {
            Err(AppError::Conflict(_)) => Err(duplicate_team_name()),
            other => other,
        }
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        input: UpdateTeam,
    ) -> AppResult<TeamProfile> {
        require_admin(caller, "Only admins can update teams")?;
        self.get_owned(caller, id).await?;

        match self.repo.update(id, &input).await {
            Ok(Some(team)) => Ok(team),
            Ok(None) => Err(AppError::NotFound),
            Err(AppError::Conflict(_)) => Err(duplicate_team_name()),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &UserProfile, id: i64) -> AppResult<()> {
        require_admin(caller, "Only admins can delete teams")?;
        self.get_owned(caller, id).await?;

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, caller, input))]
    pub async fn add_member(
        &self,
        caller: &UserProfile,
        team_id: i64,
        input: AddTeamMember,
    ) -> AppResult<()> {
        require_admin(caller, "Only admins can add team members")?;
        self.get_owned(caller, team_id).await?;

        let Some(user_id) = input.user_id else {
            return Err(AppError::InvalidInput("User ID is required".into()));
        };

        let Some(user) = self.user_repo.get_by_id(user_id).await? else {
            return Err(AppError::InvalidInput("Failed to add member to team".into()));
        };
        if user.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden(
                "Cannot add users from other organizations".into(),
            ));
        }

        if !self.repo.add_member(team_id, user_id).await? {
            return Err(AppError::InvalidInput("Failed to add member to team".into()));
        }
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn remove_member(
        &self,
        caller: &UserProfile,
        team_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        require_admin(caller, "Only admins can remove team members")?;
        let team = self.get_owned(caller, team_id).await?;

        if !team.members.iter().any(|m| m.id == user_id) {
            return Err(AppError::NotFound);
        }

        if !self.repo.remove_member(team_id, user_id).await? {
            return Err(AppError::InvalidInput(
                "Failed to remove member from team".into(),
            ));
        }
        Ok(())
    }

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<TeamProfile> {
        let team = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if team.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(team)
    }
}

fn require_admin(caller: &UserProfile, message: &str) -> AppResult<()> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden(message.into()));
    }
    Ok(())
}

fn duplicate_team_name() -> AppError {
    AppError::Conflict("Team with this name already exists in your organization".into())
}
