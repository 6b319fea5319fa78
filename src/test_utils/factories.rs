//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.
//!
//! Ids come from one process-wide sequence that the in-memory store also
//! draws from, so factory fixtures and rows created through the store never
//! collide. Default emails and phones embed the id for the same reason.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::entities::attachment::Attachment;
use crate::domain::entities::comment::{AuthorType, Comment, CommentProfile};
use crate::domain::entities::contact::{Contact, ContactEmail, ContactPhone, ContactProfile};
use crate::domain::entities::organization::Organization;
use crate::domain::entities::team::{Team, TeamProfile};
use crate::domain::entities::ticket::{Ticket, TicketPriority, TicketProfile, TicketStatus};
use crate::domain::entities::user::{User, UserProfile, UserRole};

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

/// Next value from the shared test id sequence.
pub fn next_test_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Returns a consistent test datetime (2024-01-15 12:00:00 UTC).
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

/// Create a test organization with sensible defaults.
pub fn create_test_organization(overrides: impl FnOnce(&mut Organization)) -> Organization {
    let id = next_test_id();
    let mut organization = Organization {
        id,
        name: format!("Org {}", id),
        slug: format!("org-{}", id),
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut organization);
    organization
}

/// Create a test user in the given organization. Defaults to an admin so
/// the fixture can drive every endpoint; override the role where a test
/// needs an agent.
pub fn create_test_user(
    organization: &Organization,
    overrides: impl FnOnce(&mut User),
) -> UserProfile {
    let id = next_test_id();
    let mut user = User {
        id,
        email: format!("user{}@example.test", id),
        name: format!("User {}", id),
        organization_id: organization.id,
        role: UserRole::Admin,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut user);
    UserProfile {
        user,
        organization: organization.clone(),
    }
}

/// Create a test team with no members.
pub fn create_test_team(organization_id: i64, overrides: impl FnOnce(&mut Team)) -> TeamProfile {
    let id = next_test_id();
    let mut team = Team {
        id,
        name: format!("Team {}", id),
        organization_id,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut team);
    TeamProfile {
        team,
        members: Vec::new(),
    }
}

/// Create a test contact with one unique email and one unique phone.
pub fn create_test_contact(
    organization_id: i64,
    overrides: impl FnOnce(&mut ContactProfile),
) -> ContactProfile {
    let id = next_test_id();
    let mut contact = ContactProfile {
        contact: Contact {
            id,
            name: format!("Contact {}", id),
            organization_id,
            created_at: test_datetime(),
            updated_at: test_datetime(),
        },
        emails: vec![ContactEmail {
            id: next_test_id(),
            contact_id: id,
            email: format!("contact{}@example.test", id),
            is_primary: true,
        }],
        phones: vec![ContactPhone {
            id: next_test_id(),
            contact_id: id,
            phone: format!("+1555{:07}", id),
            is_primary: true,
        }],
    };
    overrides(&mut contact);
    contact
}

/// Create a test ticket: open, normal priority, unassigned, no contact.
pub fn create_test_ticket(
    organization_id: i64,
    overrides: impl FnOnce(&mut Ticket),
) -> TicketProfile {
    let id = next_test_id();
    let mut ticket = Ticket {
        id,
        subject: format!("Ticket {}", id),
        description: Some("Something went wrong".to_string()),
        status: TicketStatus::Open,
        priority: TicketPriority::Normal,
        assignee_id: None,
        contact_id: None,
        organization_id,
        closed_at: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut ticket);
    TicketProfile {
        ticket,
        assignee: None,
        contact: None,
        attachments: Vec::new(),
    }
}

/// Create a test comment on the given ticket, authored by the given user.
pub fn create_test_comment(
    ticket: &TicketProfile,
    author: &UserProfile,
    overrides: impl FnOnce(&mut Comment),
) -> CommentProfile {
    let id = next_test_id();
    let mut comment = Comment {
        id,
        ticket_id: ticket.id(),
        body: "Looking into it".to_string(),
        body_html: "<p>Looking into it</p>".to_string(),
        is_private: false,
        author_type: AuthorType::User,
        author_id: author.id(),
        organization_id: ticket.ticket.organization_id,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut comment);
    CommentProfile {
        comment,
        author: None,
        attachments: Vec::new(),
    }
}

/// Create test attachment metadata.
pub fn create_test_attachment(
    organization_id: i64,
    overrides: impl FnOnce(&mut Attachment),
) -> Attachment {
    let id = next_test_id();
    let mut attachment = Attachment {
        id,
        file_name: format!("file{}.txt", id),
        content_type: "text/plain".to_string(),
        size: 2048,
        file_path: format!("/files/file{}.txt", id),
        organization_id,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut attachment);
    attachment
}
