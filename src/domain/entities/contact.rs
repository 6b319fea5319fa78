use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub id: i64,
    pub contact_id: i64,
    pub email: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPhone {
    pub id: i64,
    pub contact_id: i64,
    pub phone: String,
    pub is_primary: bool,
}

/// Contact with its identifier collections embedded.
///
/// Invariant: at least one email or one phone is present after any
/// create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    #[serde(flatten)]
    pub contact: Contact,
    pub emails: Vec<ContactEmail>,
    pub phones: Vec<ContactPhone>,
}

impl ContactProfile {
    pub fn id(&self) -> i64 {
        self.contact.id
    }

    pub fn organization_id(&self) -> i64 {
        self.contact.organization_id
    }

    pub fn email_values(&self) -> Vec<String> {
        self.emails.iter().map(|e| e.email.clone()).collect()
    }

    pub fn phone_values(&self) -> Vec<String> {
        self.phones.iter().map(|p| p.phone.clone()).collect()
    }
}
