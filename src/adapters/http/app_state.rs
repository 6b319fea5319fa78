use std::sync::Arc;

use crate::{
    application::cursor::clamp_page_size,
    application::use_cases::{
        attachment::AttachmentUseCases, auth::AuthUseCases, comment::CommentUseCases,
        contact::ContactUseCases, organization::OrganizationUseCases, team::TeamUseCases,
        ticket::TicketUseCases, user::UserUseCases,
    },
    infra::config::AppConfig,
    infra::rate_limit::RateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub organization_use_cases: Arc<OrganizationUseCases>,
    pub user_use_cases: Arc<UserUseCases>,
    pub team_use_cases: Arc<TeamUseCases>,
    pub contact_use_cases: Arc<ContactUseCases>,
    pub ticket_use_cases: Arc<TicketUseCases>,
    pub comment_use_cases: Arc<CommentUseCases>,
    pub attachment_use_cases: Arc<AttachmentUseCases>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Resolves the `limit` query parameter against the configured bounds.
    pub fn page_size(&self, limit: Option<u32>) -> usize {
        clamp_page_size(limit, self.config.default_page_size, self.config.max_page_size)
    }
}
