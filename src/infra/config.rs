use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Fixed-window length for the per-key rate limit.
    pub rate_limit_window_ms: u64,
    /// Requests admitted per key per window.
    pub rate_limit_max_requests: u64,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url: String = get_env("DATABASE_URL");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3000".parse().unwrap());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let rate_limit_window_ms: u64 = get_env_default("RATE_LIMIT_WINDOW_MS", 1000);
        let rate_limit_max_requests: u64 = get_env_default("RATE_LIMIT_MAX_REQUESTS", 5);
        let default_page_size: usize = get_env_default("DEFAULT_PAGE_SIZE", 10);
        let max_page_size: usize = get_env_default("MAX_PAGE_SIZE", 100);

        Self {
            database_url,
            bind_addr,
            cors_origin,
            rate_limit_window_ms,
            rate_limit_max_requests,
            default_page_size,
            max_page_size,
        }
    }
}
