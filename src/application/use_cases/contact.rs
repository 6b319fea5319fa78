use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::{CursorPosition, Page, decode_cursor, paginate};
use crate::application::validators::{is_valid_email, is_valid_phone};
use crate::domain::entities::contact::ContactProfile;
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait ContactRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<ContactProfile>>;
    async fn list(
        &self,
        organization_id: i64,
        filters: &ContactFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<ContactProfile>>;
    /// Any contact in the organization matching at least one of the given
    /// emails or phones. Empty inputs never match. When several contacts
    /// match, the one with the lowest id is returned.
    async fn find_existing(
        &self,
        organization_id: i64,
        emails: &[String],
        phones: &[String],
    ) -> AppResult<Option<ContactProfile>>;
    /// Inserts the contact row and both identifier collections as one
    /// atomic unit.
    async fn create(
        &self,
        organization_id: i64,
        name: &str,
        emails: &[NewEmail],
        phones: &[NewPhone],
    ) -> AppResult<ContactProfile>;
    async fn update(&self, id: i64, changes: &ContactChanges) -> AppResult<Option<ContactProfile>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// Listing filters. `email` and `phone` match against the identifier
/// collections, `name` against the contact itself; all as substrings.
#[derive(Debug, Clone, Default)]
pub struct ContactFilters {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactEmailInput {
    pub email: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPhoneInput {
    pub phone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateContact {
    pub name: Option<String>,
    pub emails: Option<Vec<ContactEmailInput>>,
    pub phones: Option<Vec<ContactPhoneInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub name: Option<String>,
    pub emails: Option<Vec<ContactEmailInput>>,
    pub phones: Option<Vec<ContactPhoneInput>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmail {
    pub email: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPhone {
    pub phone: String,
    pub is_primary: bool,
}

/// Validated changes handed to storage. A `Some` collection replaces the
/// stored one wholesale; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub emails: Option<Vec<NewEmail>>,
    pub phones: Option<Vec<NewPhone>>,
}

/// Serializes the find-then-write merge sequence per organization so two
/// concurrent creates with the same identifiers cannot both miss the
/// lookup and insert duplicates.
#[derive(Clone, Default)]
struct TenantLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl TenantLocks {
    async fn acquire(&self, organization_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(organization_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct ContactUseCases {
    repo: Arc<dyn ContactRepo>,
    merge_locks: TenantLocks,
}

impl ContactUseCases {
    pub fn new(repo: Arc<dyn ContactRepo>) -> Self {
        Self {
            repo,
            merge_locks: TenantLocks::default(),
        }
    }

    #[instrument(skip(self, caller))]
    pub async fn list(
        &self,
        caller: &UserProfile,
        filters: &ContactFilters,
        cursor: Option<&str>,
        page_size: usize,
    ) -> AppResult<Page<ContactProfile>> {
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
    pub async fn get(&self, caller: &UserProfile, id: i64) -> AppResult<ContactProfile> {
        self.get_owned(caller, id).await
    }

    /// Smart merge: when any supplied email or phone already identifies a
    /// contact in the organization, that contact is updated in place
    /// instead of a duplicate being created. Both outcomes return the
    /// hydrated contact.
    #[instrument(skip(self, caller, input))]
    pub async fn create_or_merge(
        &self,
        caller: &UserProfile,
        input: CreateContact,
    ) -> AppResult<ContactProfile> {
        let Some(name) = input.name.filter(|n| !n.is_empty()) else {
            return Err(AppError::InvalidInput("Name is required".into()));
        };

        let has_email = input.emails.as_ref().is_some_and(|e| !e.is_empty());
        let has_phone = input.phones.as_ref().is_some_and(|p| !p.is_empty());
        if !has_email && !has_phone {
            return Err(AppError::InvalidInput(
                "At least one email or phone number is required".into(),
            ));
        }

        let emails = input.emails.map(validate_emails).transpose()?;
        let phones = input.phones.map(validate_phones).transpose()?;

        let email_values: Vec<String> = emails
            .iter()
            .flatten()
            .map(|e| e.email.clone())
            .collect();
        let phone_values: Vec<String> = phones
            .iter()
            .flatten()
            .map(|p| p.phone.clone())
            .collect();

        let organization_id = caller.organization_id();
        let _guard = self.merge_locks.acquire(organization_id).await;

        if let Some(existing) = self
            .repo
            .find_existing(organization_id, &email_values, &phone_values)
            .await?
        {
            let changes = ContactChanges {
                name: Some(name),
                emails,
                phones,
            };
            return self
                .repo
                .update(existing.id(), &changes)
                .await?
                .ok_or(AppError::NotFound);
        }

        self.repo
            .create(
                organization_id,
                &name,
                emails.as_deref().unwrap_or_default(),
                phones.as_deref().unwrap_or_default(),
            )
            .await
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &UserProfile,
        id: i64,
        input: UpdateContact,
    ) -> AppResult<ContactProfile> {
        let existing = self.get_owned(caller, id).await?;

        // The invariant is checked against the projected post-update
        // state: a supplied collection replaces the stored one.
        let will_have_email = match &input.emails {
            Some(emails) => !emails.is_empty(),
            None => !existing.emails.is_empty(),
        };
        let will_have_phone = match &input.phones {
            Some(phones) => !phones.is_empty(),
            None => !existing.phones.is_empty(),
        };
        if !will_have_email && !will_have_phone {
            return Err(AppError::InvalidInput(
                "Contact must have at least one email or phone number".into(),
            ));
        }

        let changes = ContactChanges {
            name: input.name,
            emails: input.emails.map(validate_emails).transpose()?,
            phones: input.phones.map(validate_phones).transpose()?,
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

    async fn get_owned(&self, caller: &UserProfile, id: i64) -> AppResult<ContactProfile> {
        let contact = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        if contact.organization_id() != caller.organization_id() {
            return Err(AppError::Forbidden("Access denied".into()));
        }
        Ok(contact)
    }
}

fn validate_emails(inputs: Vec<ContactEmailInput>) -> AppResult<Vec<NewEmail>> {
    inputs
        .into_iter()
        .map(|input| {
            let email = input.email.unwrap_or_default();
            if !is_valid_email(&email) {
                return Err(AppError::InvalidInput("Invalid email format".into()));
            }
            Ok(NewEmail {
                email,
                is_primary: input.is_primary,
            })
        })
        .collect()
}

fn validate_phones(inputs: Vec<ContactPhoneInput>) -> AppResult<Vec<NewPhone>> {
    inputs
        .into_iter()
        .map(|input| {
            let phone = input.phone.unwrap_or_default();
            if !is_valid_phone(&phone) {
                return Err(AppError::InvalidInput("Invalid phone number format".into()));
            }
            Ok(NewPhone {
                phone,
                is_primary: input.is_primary,
            })
        })
        .collect()
}
