use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::app_error::{AppError, AppResult};
use crate::application::use_cases::user::UserRepo;
use crate::domain::entities::api_key::ApiKey;
use crate::domain::entities::user::UserProfile;

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn create(&self, user_id: i64, key_hash: &str) -> AppResult<ApiKey>;
    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>>;
    async fn touch_last_used(&self, id: i64) -> AppResult<()>;
}

/// Resolves raw API keys to the user they belong to.
#[derive(Clone)]
pub struct AuthUseCases {
    api_key_repo: Arc<dyn ApiKeyRepo>,
    user_repo: Arc<dyn UserRepo>,
}

impl AuthUseCases {
    pub fn new(api_key_repo: Arc<dyn ApiKeyRepo>, user_repo: Arc<dyn UserRepo>) -> Self {
        Self {
            api_key_repo,
            user_repo,
        }
    }

    /// Look up the key by its hash and load the owning user.
    /// Keys whose user row is gone are rejected.
    #[instrument(skip(self, raw_key))]
    pub async fn authenticate(&self, raw_key: &str) -> AppResult<UserProfile> {
        let key_hash = hash_api_key(raw_key);

        let key = self
            .api_key_repo
            .get_by_hash(&key_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid API key".into()))?;

        let user = self
            .user_repo
            .get_by_id(key.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        // Best effort; a failed touch must not reject the request.
        if let Err(err) = self.api_key_repo.touch_last_used(key.id).await {
            tracing::warn!(error = ?err, key_id = key.id, "Failed to update key last_used_at");
        }

        Ok(user)
    }

    /// Mint a key for a user. Returns the record and the raw key,
    /// which is never stored and cannot be recovered later.
    pub async fn issue_key(&self, user_id: i64) -> AppResult<(ApiKey, String)> {
        let raw_key = generate_api_key();
        let key_hash = hash_api_key(&raw_key);

        let key = self.api_key_repo.create(user_id, &key_hash).await?;
        Ok((key, raw_key))
    }
}

/// Generate a new API key with format: hd_live_<base64url_24_bytes>
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 24]; // 24 bytes = 32 chars base64
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let random_part = URL_SAFE_NO_PAD.encode(bytes);
    format!("hd_live_{}", random_part)
}

/// Hash an API key using SHA-256, returning hex-encoded hash.
pub fn hash_api_key(raw_key: &str) -> String {
    let hash = Sha256::digest(raw_key.as_bytes());
    hex::encode(hash)
}
