//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` assembles an `AppState` over one shared
//! `InMemoryStore`, seeded through the `with_*` methods. The default rate
//! limiter has a quota no test can exhaust; admission tests swap in a real
//! window via `with_rate_limiter`.

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::adapters::http::app_state::AppState;
use crate::application::use_cases::attachment::{AttachmentRepo, AttachmentUseCases};
use crate::application::use_cases::auth::{ApiKeyRepo, AuthUseCases, hash_api_key};
use crate::application::use_cases::comment::{CommentRepo, CommentUseCases};
use crate::application::use_cases::contact::{ContactRepo, ContactUseCases};
use crate::application::use_cases::organization::{OrganizationRepo, OrganizationUseCases};
use crate::application::use_cases::team::{TeamRepo, TeamUseCases};
use crate::application::use_cases::ticket::{TicketRepo, TicketUseCases};
use crate::application::use_cases::user::{UserRepo, UserUseCases};
use crate::domain::entities::api_key::ApiKey;
use crate::domain::entities::attachment::Attachment;
use crate::domain::entities::comment::CommentProfile;
use crate::domain::entities::contact::ContactProfile;
use crate::domain::entities::organization::Organization;
use crate::domain::entities::team::TeamProfile;
use crate::domain::entities::ticket::TicketProfile;
use crate::domain::entities::user::UserProfile;
use crate::infra::config::AppConfig;
use crate::infra::rate_limit::{FixedWindowRateLimiter, RateLimiter};
use crate::test_utils::factories::{next_test_id, test_datetime};
use crate::test_utils::mocks::InMemoryStore;

/// Config values mirroring the documented environment defaults.
fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        rate_limit_window_ms: 1000,
        rate_limit_max_requests: 5,
        default_page_size: 10,
        max_page_size: 100,
    }
}

pub struct TestAppStateBuilder {
    store: Arc<InMemoryStore>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            rate_limiter: Arc::new(FixedWindowRateLimiter::new(60_000, u64::MAX)),
        }
    }

    pub fn with_organization(self, organization: &Organization) -> Self {
        self.store
            .organizations
            .lock()
            .unwrap()
            .insert(organization.id, organization.clone());
        self
    }

    /// Seed a user together with its organization.
    pub fn with_user(self, user: &UserProfile) -> Self {
        self.store
            .organizations
            .lock()
            .unwrap()
            .insert(user.organization.id, user.organization.clone());
        self.store
            .users
            .lock()
            .unwrap()
            .insert(user.id(), user.user.clone());
        self
    }

    pub fn with_team(self, team: &TeamProfile) -> Self {
        self.store
            .teams
            .lock()
            .unwrap()
            .insert(team.id(), team.team.clone());
        for member in &team.members {
            self.store
                .team_members
                .lock()
                .unwrap()
                .insert((team.id(), member.id));
        }
        self
    }

    pub fn with_contact(self, contact: &ContactProfile) -> Self {
        self.store
            .contacts
            .lock()
            .unwrap()
            .insert(contact.id(), contact.clone());
        self
    }

    pub fn with_ticket(self, ticket: &TicketProfile) -> Self {
        self.store
            .tickets
            .lock()
            .unwrap()
            .insert(ticket.id(), ticket.ticket.clone());
        self
    }

    pub fn with_comment(self, comment: &CommentProfile) -> Self {
        self.store
            .comments
            .lock()
            .unwrap()
            .insert(comment.id(), comment.comment.clone());
        self
    }

    pub fn with_attachment(self, attachment: &Attachment) -> Self {
        self.store
            .attachments
            .lock()
            .unwrap()
            .insert(attachment.id, attachment.clone());
        self
    }

    /// Register a raw API key for the given user; only the hash is stored.
    pub fn with_api_key(self, user_id: i64, raw_key: &str) -> Self {
        let key = ApiKey {
            id: next_test_id(),
            key_hash: hash_api_key(raw_key),
            user_id,
            created_at: test_datetime(),
            last_used_at: None,
        };
        self.store.api_keys.lock().unwrap().insert(key.id, key);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn build(self) -> AppState {
        let store = self.store;

        let api_key_repo = store.clone() as Arc<dyn ApiKeyRepo>;
        let organization_repo = store.clone() as Arc<dyn OrganizationRepo>;
        let user_repo = store.clone() as Arc<dyn UserRepo>;
        let team_repo = store.clone() as Arc<dyn TeamRepo>;
        let contact_repo = store.clone() as Arc<dyn ContactRepo>;
        let ticket_repo = store.clone() as Arc<dyn TicketRepo>;
        let comment_repo = store.clone() as Arc<dyn CommentRepo>;
        let attachment_repo = store.clone() as Arc<dyn AttachmentRepo>;

        let auth_use_cases = AuthUseCases::new(api_key_repo, user_repo.clone());
        let organization_use_cases = OrganizationUseCases::new(organization_repo);
        let user_use_cases = UserUseCases::new(user_repo.clone());
        let team_use_cases = TeamUseCases::new(team_repo, user_repo.clone());
        let contact_use_cases = ContactUseCases::new(contact_repo.clone());
        let ticket_use_cases = TicketUseCases::new(ticket_repo.clone(), user_repo, contact_repo);
        let comment_use_cases = CommentUseCases::new(comment_repo.clone(), ticket_repo.clone());
        let attachment_use_cases =
            AttachmentUseCases::new(attachment_repo, ticket_repo, comment_repo);

        AppState {
            config: Arc::new(test_config()),
            auth_use_cases: Arc::new(auth_use_cases),
            organization_use_cases: Arc::new(organization_use_cases),
            user_use_cases: Arc::new(user_use_cases),
            team_use_cases: Arc::new(team_use_cases),
            contact_use_cases: Arc::new(contact_use_cases),
            ticket_use_cases: Arc::new(ticket_use_cases),
            comment_use_cases: Arc::new(comment_use_cases),
            attachment_use_cases: Arc::new(attachment_use_cases),
            rate_limiter: self.rate_limiter,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
