use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored credential. Only the SHA-256 hex digest of the key is kept;
/// the plaintext is shown once at creation time and never again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: i64,
    pub key_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
