use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::domain::entities::user::{UserProfile, UserRole};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>>;
    async fn list(
        &self,
        organization_id: i64,
        filters: &UserFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<UserProfile>>;
    async fn create(
        &self,
        organization_id: i64,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> AppResult<UserProfile>;
    async fn update(&self, id: i64, changes: &UserChanges) -> AppResult<Option<UserProfile>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// Listing filters; both match as substrings.
#[derive(Debug, Clone, Default)]
pub struct UserFilters {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Validated field updates handed to storage. `None` leaves a column
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Clone)]
pub struct UserUseCases {
    repo: Arc<dyn UserRepo>,
}

impl UserUseCases {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    pub fn me(&self, caller: &UserProfile) -> UserProfile {
        caller.clone()
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        filters: &UserFilters,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<UserProfile>> {
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
        Ok(paginate(rows, page_size, token.is_some(), |u| {
            CursorPosition::by_id(u.id())
        }))
    }

    #[instrument(skip(self, caller))]
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<UserProfile> {
        self.get_owned(caller, id).await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn create(&self, caller: &UserProfile, input: CreateUser) -> AppResult<UserProfile> {
        let (Some(email), Some(name), Some(role)) = (
            input.email.filter(|s| !s.is_empty()),
            input.name.filter(|s| !s.is_empty()),
            input.role.filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::InvalidInput(
                "Email, name, and role are required".into(),
            ));
        };

        let role = parse_role(&role)?;

        match self
            .repo
            .create(caller.organization_id(), &email, &name, role)
            .await
        {
            Err(AppError::Conflict(_)) => Err(AppError::Conflict(
                "User with this email already exists".into(),
            )),
            other => other,
        }
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        input: UpdateUser,
    ) -> AppResult<UserProfile> {
        self.get_owned(caller, id).await?;

        let role = match input.role.as_deref() {
            Some(raw) => {
                let role = parse_role(raw)?;
                if id == caller.id() {
                    return Err(AppError::Forbidden("Cannot update your own role".into()));
                }
                if !caller.is_admin() {
                    return Err(AppError::Forbidden(
                        "Only admins can update user roles".into(),
                    ));
                }
                Some(role)
            }
            None => None,
        };

        let changes = UserChanges {
            email: input.email,
            name: input.name,
            role,
        };

        match self.repo.update(id, &changes).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotFound),
            Err(AppError::Conflict(_)) => Err(AppError::Conflict(
                "User with this email already exists".into(),
            )),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &UserProfile, id: i64) -> AppResult<()> {
        if id == caller.id() {
            return Err(AppError::Forbidden("Cannot delete your own account".into()));
        }

        let target = self.get_owned(caller, id).await?;
        if target.is_admin() {
            return Err(AppError::Forbidden("Cannot delete admin users".into()));
        }

        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<UserProfile> {
        let user = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if user.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(user)
    }
}

fn parse_role(raw: &str) -> AppResult<UserRole> {
    raw.parse().map_err(|_| {
        AppError::InvalidInput("Role must be either \"admin\" or \"agent\"".into())
    })
}
