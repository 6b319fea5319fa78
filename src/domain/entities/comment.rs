use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::{attachment::Attachment, contact::Contact, user::User};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthorType {
    User,
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub body: String,
    pub body_html: String,
    pub is_private: bool,
    pub author_type: AuthorType,
    pub author_id: i64,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Either side of a comment's authorship. User comes first so agent
/// records are tried before the looser contact shape when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentAuthor {
    User(User),
    Contact(Contact),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentProfile {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<CommentAuthor>,
    pub attachments: Vec<Attachment>,
}

impl CommentProfile {
    pub fn id(&self) -> i64 {
        self.comment.id
    }

    pub fn organization_id(&self) -> i64 {
        self.comment.organization_id
    }
}
