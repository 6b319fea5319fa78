use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File metadata only. The bytes themselves live wherever `file_path`
/// points and are never served by this API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub file_path: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
