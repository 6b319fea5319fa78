use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::{
    adapters::http::app_state::AppState, app_error::AppError,
    domain::entities::user::UserProfile,
};

/// Authenticated caller, inserted into request extensions by
/// `authenticate_middleware` and read by every handler.
#[derive(Clone)]
pub struct CurrentUser(pub UserProfile);

/// Resolves the `x-api-key` header to a user. The health check path is
/// the only route that skips this.
pub async fn authenticate_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.uri().path() == "/" {
        return Ok(next.run(request).await);
    }

    let raw_key = api_key_header(&request)?;
    let user = app_state.auth_use_cases.authenticate(&raw_key).await?;
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Fixed-window admission per API key. Runs after authentication, so a
/// caller only spends quota on a key it has proven ownership of. Admitted
/// responses carry the quota headers; rejections add Retry-After.
pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.uri().path() == "/" {
        return Ok(next.run(request).await);
    }

    let key = api_key_header(&request)?;
    let decision = app_state.rate_limiter.check(&key).await;
    if !decision.allowed {
        return Err(AppError::RateLimited {
            limit: decision.limit,
            remaining: decision.remaining,
            reset_ms: decision.reset_ms,
            retry_after_secs: decision.retry_after_secs,
        });
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_ms));
    Ok(response)
}

fn api_key_header(request: &Request) -> Result<String, AppError> {
    // An empty header value counts as missing.
    request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("API key is required".into()))
}
