use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team with its member list embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<User>,
}

impl TeamProfile {
    pub fn id(&self) -> i64 {
        self.team.id
    }

    pub fn organization_id(&self) -> i64 {
        self.team.organization_id
    }
}
