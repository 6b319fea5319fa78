use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        attachment::{AttachmentRepo, AttachmentUseCases},
        auth::{ApiKeyRepo, AuthUseCases},
        comment::{CommentRepo, CommentUseCases},
        contact::{ContactRepo, ContactUseCases},
        organization::{OrganizationRepo, OrganizationUseCases},
        team::{TeamRepo, TeamUseCases},
        ticket::{TicketRepo, TicketUseCases},
        user::{UserRepo, UserUseCases},
    },
    infra::{
        config::AppConfig,
        postgres_persistence,
        rate_limit::{FixedWindowRateLimiter, RateLimiter},
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowRateLimiter::new(
        config.rate_limit_window_ms,
        config.rate_limit_max_requests,
    ));

    let api_key_repo = postgres_arc.clone() as Arc<dyn ApiKeyRepo>;
    let organization_repo = postgres_arc.clone() as Arc<dyn OrganizationRepo>;
    let user_repo = postgres_arc.clone() as Arc<dyn UserRepo>;
    let team_repo = postgres_arc.clone() as Arc<dyn TeamRepo>;
    let contact_repo = postgres_arc.clone() as Arc<dyn ContactRepo>;
    let ticket_repo = postgres_arc.clone() as Arc<dyn TicketRepo>;
    let comment_repo = postgres_arc.clone() as Arc<dyn CommentRepo>;
    let attachment_repo = postgres_arc.clone() as Arc<dyn AttachmentRepo>;

    let auth_use_cases = AuthUseCases::new(api_key_repo, user_repo.clone());
    let organization_use_cases = OrganizationUseCases::new(organization_repo);
    let user_use_cases = UserUseCases::new(user_repo.clone());
    let team_use_cases = TeamUseCases::new(team_repo, user_repo.clone());
    let contact_use_cases = ContactUseCases::new(contact_repo.clone());
    let ticket_use_cases = TicketUseCases::new(ticket_repo.clone(), user_repo, contact_repo);
    let comment_use_cases = CommentUseCases::new(comment_repo.clone(), ticket_repo.clone());
    let attachment_use_cases =
        AttachmentUseCases::new(attachment_repo, ticket_repo, comment_repo);

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        organization_use_cases: Arc::new(organization_use_cases),
        user_use_cases: Arc::new(user_use_cases),
        team_use_cases: Arc::new(team_use_cases),
        contact_use_cases: Arc::new(contact_use_cases),
        ticket_use_cases: Arc::new(ticket_use_cases),
        comment_use_cases: Arc::new(comment_use_cases),
        attachment_use_cases: Arc::new(attachment_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "helpdesk_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
