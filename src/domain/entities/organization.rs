use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant. Every other entity hangs off one of these and is
/// cascade-deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
