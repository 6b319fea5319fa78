//! In-memory repository implementations for mocking persistence.
//!
//! One store implements every repository trait, mirroring how
//! `PostgresPersistence` backs them all from a single pool. Writes land in
//! plain maps; profiles are hydrated at read time, so cross-resource
//! effects (team membership, attachment links, assignee changes) show up
//! on the next fetch exactly like they do against the real database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::app_error::{AppError, AppResult};
use crate::application::cursor::CursorPosition;
use crate::application::use_cases::attachment::{AttachmentRepo, NewAttachment};
use crate::application::use_cases::auth::ApiKeyRepo;
use crate::application::use_cases::comment::{
    CommentChanges, CommentFilters, CommentRepo, NewComment,
};
use crate::application::use_cases::contact::{
    ContactChanges, ContactFilters, ContactRepo, NewEmail, NewPhone,
};
use crate::application::use_cases::organization::{OrganizationRepo, UpdateOrganization};
use crate::application::use_cases::team::{TeamRepo, UpdateTeam};
use crate::application::use_cases::ticket::{NewTicket, TicketChanges, TicketFilters, TicketRepo};
use crate::application::use_cases::user::{UserChanges, UserFilters, UserRepo};
use crate::domain::entities::api_key::ApiKey;
use crate::domain::entities::attachment::Attachment;
use crate::domain::entities::comment::{AuthorType, Comment, CommentAuthor, CommentProfile};
use crate::domain::entities::contact::{Contact, ContactEmail, ContactPhone, ContactProfile};
use crate::domain::entities::organization::Organization;
use crate::domain::entities::team::{Team, TeamProfile};
use crate::domain::entities::ticket::{Ticket, TicketProfile};
use crate::domain::entities::user::{User, UserProfile, UserRole};
use crate::test_utils::factories::next_test_id;

const DUPLICATE: &str = "A record with this value already exists";

/// Case-insensitive substring match, standing in for ILIKE '%needle%'.
fn matches_substring(filter: &Option<String>, value: &str) -> bool {
    filter
        .as_ref()
        .is_none_or(|needle| value.to_lowercase().contains(&needle.to_lowercase()))
}

/// Shared in-memory backing store for every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    pub organizations: Mutex<HashMap<i64, Organization>>,
    pub users: Mutex<HashMap<i64, User>>,
    pub api_keys: Mutex<HashMap<i64, ApiKey>>,
    pub teams: Mutex<HashMap<i64, Team>>,
    /// (team_id, user_id)
    pub team_members: Mutex<HashSet<(i64, i64)>>,
    pub contacts: Mutex<HashMap<i64, ContactProfile>>,
    pub tickets: Mutex<HashMap<i64, Ticket>>,
    pub comments: Mutex<HashMap<i64, Comment>>,
    pub attachments: Mutex<HashMap<i64, Attachment>>,
    /// (ticket_id, attachment_id)
    pub ticket_attachments: Mutex<HashSet<(i64, i64)>>,
    /// (comment_id, attachment_id)
    pub comment_attachments: Mutex<HashSet<(i64, i64)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_profile(&self, user: &User) -> UserProfile {
        let organization = self
            .organizations
            .lock()
            .unwrap()
            .get(&user.organization_id)
            .cloned()
            .expect("organization not seeded for user");
        UserProfile {
            user: user.clone(),
            organization,
        }
    }

    fn team_profile(&self, team: &Team) -> TeamProfile {
        let links = self.team_members.lock().unwrap();
        let users = self.users.lock().unwrap();
        let mut members: Vec<User> = links
            .iter()
            .filter(|(team_id, _)| *team_id == team.id)
            .filter_map(|(_, user_id)| users.get(user_id).cloned())
            .collect();
        members.sort_by_key(|member| member.id);
        TeamProfile {
            team: team.clone(),
            members,
        }
    }

    fn ticket_profile(&self, ticket: &Ticket) -> TicketProfile {
        let assignee = ticket
            .assignee_id
            .and_then(|id| self.users.lock().unwrap().get(&id).cloned());
        let contact = ticket
            .contact_id
            .and_then(|id| self.contacts.lock().unwrap().get(&id).map(|p| p.contact.clone()));
        let attachments = self.linked_attachments(&self.ticket_attachments, ticket.id);
        TicketProfile {
            ticket: ticket.clone(),
            assignee,
            contact,
            attachments,
        }
    }

    fn comment_profile(&self, comment: &Comment) -> CommentProfile {
        let author = match comment.author_type {
            AuthorType::User => self
                .users
                .lock()
                .unwrap()
                .get(&comment.author_id)
                .cloned()
                .map(CommentAuthor::User),
            AuthorType::Contact => self
                .contacts
                .lock()
                .unwrap()
                .get(&comment.author_id)
                .map(|p| CommentAuthor::Contact(p.contact.clone())),
        };
        let attachments = self.linked_attachments(&self.comment_attachments, comment.id);
        CommentProfile {
            comment: comment.clone(),
            author,
            attachments,
        }
    }

    fn linked_attachments(
        &self,
        links: &Mutex<HashSet<(i64, i64)>>,
        owner_id: i64,
    ) -> Vec<Attachment> {
        let links = links.lock().unwrap();
        let attachments = self.attachments.lock().unwrap();
        let mut linked: Vec<Attachment> = links
            .iter()
            .filter(|(owner, _)| *owner == owner_id)
            .filter_map(|(_, attachment_id)| attachments.get(attachment_id).cloned())
            .collect();
        linked.sort_by_key(|attachment| attachment.id);
        linked
    }
}

#[async_trait]
impl ApiKeyRepo for InMemoryStore {
    async fn create(&self, user_id: i64, key_hash: &str) -> AppResult<ApiKey> {
        let mut api_keys = self.api_keys.lock().unwrap();
        if api_keys.values().any(|key| key.key_hash == key_hash) {
            return Err(AppError::Conflict(DUPLICATE.into()));
        }
        let key = ApiKey {
            id: next_test_id(),
            key_hash: key_hash.to_string(),
            user_id,
            created_at: Utc::now(),
            last_used_at: None,
        };
        api_keys.insert(key.id, key.clone());
        Ok(key)
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let api_keys = self.api_keys.lock().unwrap();
        Ok(api_keys.values().find(|key| key.key_hash == key_hash).cloned())
    }

    async fn touch_last_used(&self, id: i64) -> AppResult<()> {
        if let Some(key) = self.api_keys.lock().unwrap().get_mut(&id) {
            key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Organization>> {
        Ok(self.organizations.lock().unwrap().get(&id).cloned())
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateOrganization,
    ) -> AppResult<Option<Organization>> {
        let mut organizations = self.organizations.lock().unwrap();
        if let Some(slug) = &changes.slug {
            if organizations.values().any(|o| o.id != id && o.slug == *slug) {
                return Err(AppError::Conflict(DUPLICATE.into()));
            }
        }
        let Some(organization) = organizations.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            organization.name = name.clone();
        }
        if let Some(slug) = &changes.slug {
            organization.slug = slug.clone();
        }
        organization.updated_at = Utc::now();
        Ok(Some(organization.clone()))
    }
}

#[async_trait]
impl UserRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>> {
        let user = self.users.lock().unwrap().get(&id).cloned();
        Ok(user.map(|user| self.user_profile(&user)))
    }

    async fn list(
        &self,
        organization_id: i64,
        filters: &UserFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<UserProfile>> {
        let mut rows: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|user| user.organization_id == organization_id)
            .filter(|user| matches_substring(&filters.email, &user.email))
            .filter(|user| matches_substring(&filters.name, &user.name))
            .filter(|user| after_id.is_none_or(|after| user.id > after))
            .cloned()
            .collect();
        rows.sort_by_key(|user| user.id);
        rows.truncate(fetch as usize);
        Ok(rows.iter().map(|user| self.user_profile(user)).collect())
    }

    async fn create(
        &self,
        organization_id: i64,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> AppResult<UserProfile> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|user| user.email == email) {
            return Err(AppError::Conflict(DUPLICATE.into()));
        }
        let now = Utc::now();
        let user = User {
            id: next_test_id(),
            email: email.to_string(),
            name: name.to_string(),
            organization_id,
            role,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        drop(users);
        Ok(self.user_profile(&user))
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> AppResult<Option<UserProfile>> {
        let mut users = self.users.lock().unwrap();
        if let Some(email) = &changes.email {
            if users.values().any(|user| user.id != id && user.email == *email) {
                return Err(AppError::Conflict(DUPLICATE.into()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        let user = user.clone();
        drop(users);
        Ok(Some(self.user_profile(&user)))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.users.lock().unwrap().remove(&id).is_some();
        if removed {
            // Mirror the FK behavior: memberships and keys cascade,
            // ticket assignments null out.
            self.team_members
                .lock()
                .unwrap()
                .retain(|(_, user_id)| *user_id != id);
            self.api_keys.lock().unwrap().retain(|_, key| key.user_id != id);
            for ticket in self.tickets.lock().unwrap().values_mut() {
                if ticket.assignee_id == Some(id) {
                    ticket.assignee_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl TeamRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TeamProfile>> {
        let team = self.teams.lock().unwrap().get(&id).cloned();
        Ok(team.map(|team| self.team_profile(&team)))
    }

    async fn list(
        &self,
        organization_id: i64,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<TeamProfile>> {
        let mut rows: Vec<Team> = self
            .teams
            .lock()
            .unwrap()
            .values()
            .filter(|team| team.organization_id == organization_id)
            .filter(|team| after_id.is_none_or(|after| team.id > after))
            .cloned()
            .collect();
        rows.sort_by_key(|team| team.id);
        rows.truncate(fetch as usize);
        Ok(rows.iter().map(|team| self.team_profile(team)).collect())
    }

    async fn create(&self, organization_id: i64, name: &str) -> AppResult<TeamProfile> {
        let mut teams = self.teams.lock().unwrap();
        if teams
            .values()
            .any(|team| team.organization_id == organization_id && team.name == name)
        {
            return Err(AppError::Conflict(DUPLICATE.into()));
        }
        let now = Utc::now();
        let team = Team {
            id: next_test_id(),
            name: name.to_string(),
            organization_id,
            created_at: now,
            updated_at: now,
        };
        teams.insert(team.id, team.clone());
        drop(teams);
        Ok(self.team_profile(&team))
    }

    async fn update(&self, id: i64, changes: &UpdateTeam) -> AppResult<Option<TeamProfile>> {
        let mut teams = self.teams.lock().unwrap();
        let Some(organization_id) = teams.get(&id).map(|team| team.organization_id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            if teams.values().any(|team| {
                team.id != id && team.organization_id == organization_id && team.name == *name
            }) {
                return Err(AppError::Conflict(DUPLICATE.into()));
            }
        }
        let Some(team) = teams.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            team.name = name.clone();
        }
        team.updated_at = Utc::now();
        let team = team.clone();
        drop(teams);
        Ok(Some(self.team_profile(&team)))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.teams.lock().unwrap().remove(&id).is_some();
        if removed {
            self.team_members
                .lock()
                .unwrap()
                .retain(|(team_id, _)| *team_id != id);
        }
        Ok(removed)
    }

    async fn add_member(&self, team_id: i64, user_id: i64) -> AppResult<bool> {
        Ok(self.team_members.lock().unwrap().insert((team_id, user_id)))
    }

    async fn remove_member(&self, team_id: i64, user_id: i64) -> AppResult<bool> {
        Ok(self.team_members.lock().unwrap().remove(&(team_id, user_id)))
    }
}

#[async_trait]
impl ContactRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<ContactProfile>> {
        Ok(self.contacts.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        organization_id: i64,
        filters: &ContactFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<ContactProfile>> {
        let mut rows: Vec<ContactProfile> = self
            .contacts
            .lock()
            .unwrap()
            .values()
            .filter(|profile| profile.contact.organization_id == organization_id)
            .filter(|profile| matches_substring(&filters.name, &profile.contact.name))
            .filter(|profile| {
                filters.email.as_ref().is_none_or(|needle| {
                    profile
                        .emails
                        .iter()
                        .any(|e| e.email.to_lowercase().contains(&needle.to_lowercase()))
                })
            })
            .filter(|profile| {
                filters.phone.as_ref().is_none_or(|needle| {
                    profile
                        .phones
                        .iter()
                        .any(|p| p.phone.to_lowercase().contains(&needle.to_lowercase()))
                })
            })
            .filter(|profile| after_id.is_none_or(|after| profile.id() > after))
            .cloned()
            .collect();
        rows.sort_by_key(|profile| profile.id());
        rows.truncate(fetch as usize);
        Ok(rows)
    }

    async fn find_existing(
        &self,
        organization_id: i64,
        emails: &[String],
        phones: &[String],
    ) -> AppResult<Option<ContactProfile>> {
        let contacts = self.contacts.lock().unwrap();
        Ok(contacts
            .values()
            .filter(|profile| profile.contact.organization_id == organization_id)
            .filter(|profile| {
                profile.emails.iter().any(|e| emails.contains(&e.email))
                    || profile.phones.iter().any(|p| phones.contains(&p.phone))
            })
            .min_by_key(|profile| profile.id())
            .cloned())
    }

    async fn create(
        &self,
        organization_id: i64,
        name: &str,
        emails: &[NewEmail],
        phones: &[NewPhone],
    ) -> AppResult<ContactProfile> {
        let id = next_test_id();
        let now = Utc::now();
        let profile = ContactProfile {
            contact: Contact {
                id,
                name: name.to_string(),
                organization_id,
                created_at: now,
                updated_at: now,
            },
            emails: emails
                .iter()
                .map(|e| ContactEmail {
                    id: next_test_id(),
                    contact_id: id,
                    email: e.email.clone(),
                    is_primary: e.is_primary,
                })
                .collect(),
            phones: phones
                .iter()
                .map(|p| ContactPhone {
                    id: next_test_id(),
                    contact_id: id,
                    phone: p.phone.clone(),
                    is_primary: p.is_primary,
                })
                .collect(),
        };
        self.contacts.lock().unwrap().insert(id, profile.clone());
        Ok(profile)
    }

    async fn update(&self, id: i64, changes: &ContactChanges) -> AppResult<Option<ContactProfile>> {
        let mut contacts = self.contacts.lock().unwrap();
        let Some(profile) = contacts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            profile.contact.name = name.clone();
        }
        if let Some(emails) = &changes.emails {
            profile.emails = emails
                .iter()
                .map(|e| ContactEmail {
                    id: next_test_id(),
                    contact_id: id,
                    email: e.email.clone(),
                    is_primary: e.is_primary,
                })
                .collect();
        }
        if let Some(phones) = &changes.phones {
            profile.phones = phones
                .iter()
                .map(|p| ContactPhone {
                    id: next_test_id(),
                    contact_id: id,
                    phone: p.phone.clone(),
                    is_primary: p.is_primary,
                })
                .collect();
        }
        profile.contact.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.contacts.lock().unwrap().remove(&id).is_some();
        if removed {
            for ticket in self.tickets.lock().unwrap().values_mut() {
                if ticket.contact_id == Some(id) {
                    ticket.contact_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl TicketRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<TicketProfile>> {
        let ticket = self.tickets.lock().unwrap().get(&id).cloned();
        Ok(ticket.map(|ticket| self.ticket_profile(&ticket)))
    }

    async fn list(
        &self,
        organization_id: i64,
        filters: &TicketFilters,
        cursor: Option<CursorPosition>,
        fetch: i64,
    ) -> AppResult<Vec<TicketProfile>> {
        let mut rows: Vec<Ticket> = self
            .tickets
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.organization_id == organization_id)
            .filter(|t| filters.status.is_none_or(|status| t.status == status))
            .filter(|t| filters.priority.is_none_or(|priority| t.priority == priority))
            .filter(|t| {
                filters
                    .assignee_id
                    .is_none_or(|assignee_id| t.assignee_id == Some(assignee_id))
            })
            .filter(|t| {
                filters
                    .contact_id
                    .is_none_or(|contact_id| t.contact_id == Some(contact_id))
            })
            .filter(|t| filters.created_at_gt.is_none_or(|bound| t.created_at > bound))
            .filter(|t| filters.created_at_lt.is_none_or(|bound| t.created_at < bound))
            .filter(|t| filters.updated_at_gt.is_none_or(|bound| t.updated_at > bound))
            .filter(|t| filters.updated_at_lt.is_none_or(|bound| t.updated_at < bound))
            .cloned()
            .collect();
        if let Some(CursorPosition {
            id,
            created_at: Some(created_at),
        }) = cursor
        {
            rows.retain(|t| {
                t.created_at < created_at || (t.created_at == created_at && t.id < id)
            });
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(fetch as usize);
        Ok(rows.iter().map(|t| self.ticket_profile(t)).collect())
    }

    async fn create(&self, ticket: &NewTicket) -> AppResult<TicketProfile> {
        let now = Utc::now();
        let row = Ticket {
            id: next_test_id(),
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            status: ticket.status,
            priority: ticket.priority,
            assignee_id: ticket.assignee_id,
            contact_id: ticket.contact_id,
            organization_id: ticket.organization_id,
            closed_at: ticket.closed_at,
            created_at: now,
            updated_at: now,
        };
        self.tickets.lock().unwrap().insert(row.id, row.clone());
        Ok(self.ticket_profile(&row))
    }

    async fn update(&self, id: i64, changes: &TicketChanges) -> AppResult<Option<TicketProfile>> {
        let mut tickets = self.tickets.lock().unwrap();
        let Some(ticket) = tickets.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(subject) = &changes.subject {
            ticket.subject = subject.clone();
        }
        if let Some(description) = &changes.description {
            ticket.description = Some(description.clone());
        }
        if let Some(status) = changes.status {
            ticket.status = status;
        }
        if let Some(priority) = changes.priority {
            ticket.priority = priority;
        }
        if let Some(assignee_id) = changes.assignee_id {
            ticket.assignee_id = assignee_id;
        }
        if let Some(contact_id) = changes.contact_id {
            ticket.contact_id = contact_id;
        }
        if let Some(closed_at) = changes.closed_at {
            ticket.closed_at = closed_at;
        }
        ticket.updated_at = Utc::now();
        let row = ticket.clone();
        drop(tickets);
        Ok(Some(self.ticket_profile(&row)))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.tickets.lock().unwrap().remove(&id).is_some();
        if removed {
            let mut comments = self.comments.lock().unwrap();
            let orphaned: Vec<i64> = comments
                .values()
                .filter(|comment| comment.ticket_id == id)
                .map(|comment| comment.id)
                .collect();
            comments.retain(|_, comment| comment.ticket_id != id);
            drop(comments);
            self.ticket_attachments
                .lock()
                .unwrap()
                .retain(|(ticket_id, _)| *ticket_id != id);
            self.comment_attachments
                .lock()
                .unwrap()
                .retain(|(comment_id, _)| !orphaned.contains(comment_id));
        }
        Ok(removed)
    }
}

#[async_trait]
impl CommentRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<CommentProfile>> {
        let comment = self.comments.lock().unwrap().get(&id).cloned();
        Ok(comment.map(|comment| self.comment_profile(&comment)))
    }

    async fn list(
        &self,
        organization_id: i64,
        filters: &CommentFilters,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<CommentProfile>> {
        let mut rows: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.organization_id == organization_id)
            .filter(|c| filters.ticket_id.is_none_or(|ticket_id| c.ticket_id == ticket_id))
            .filter(|c| {
                filters
                    .is_private
                    .is_none_or(|is_private| c.is_private == is_private)
            })
            .filter(|c| after_id.is_none_or(|after| c.id > after))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        rows.truncate(fetch as usize);
        Ok(rows.iter().map(|c| self.comment_profile(c)).collect())
    }

    async fn create(&self, comment: &NewComment) -> AppResult<CommentProfile> {
        let now = Utc::now();
        let row = Comment {
            id: next_test_id(),
            ticket_id: comment.ticket_id,
            body: comment.body.clone(),
            body_html: comment.body_html.clone(),
            is_private: comment.is_private,
            author_type: comment.author_type,
            author_id: comment.author_id,
            organization_id: comment.organization_id,
            created_at: now,
            updated_at: now,
        };
        self.comments.lock().unwrap().insert(row.id, row.clone());
        Ok(self.comment_profile(&row))
    }

    async fn update(&self, id: i64, changes: &CommentChanges) -> AppResult<Option<CommentProfile>> {
        let mut comments = self.comments.lock().unwrap();
        let Some(comment) = comments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(body) = &changes.body {
            comment.body = body.clone();
        }
        if let Some(body_html) = &changes.body_html {
            comment.body_html = body_html.clone();
        }
        if let Some(is_private) = changes.is_private {
            comment.is_private = is_private;
        }
        comment.updated_at = Utc::now();
        let row = comment.clone();
        drop(comments);
        Ok(Some(self.comment_profile(&row)))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.comments.lock().unwrap().remove(&id).is_some();
        if removed {
            self.comment_attachments
                .lock()
                .unwrap()
                .retain(|(comment_id, _)| *comment_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AttachmentRepo for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Attachment>> {
        Ok(self.attachments.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        organization_id: i64,
        after_id: Option<i64>,
        fetch: i64,
    ) -> AppResult<Vec<Attachment>> {
        let mut rows: Vec<Attachment> = self
            .attachments
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| after_id.is_none_or(|after| a.id > after))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        rows.truncate(fetch as usize);
        Ok(rows)
    }

    async fn create(&self, organization_id: i64, meta: &NewAttachment) -> AppResult<Attachment> {
        let now = Utc::now();
        let attachment = Attachment {
            id: next_test_id(),
            file_name: meta.file_name.clone(),
            content_type: meta.content_type.clone(),
            size: meta.size,
            file_path: meta.file_path.clone(),
            organization_id,
            created_at: now,
            updated_at: now,
        };
        self.attachments
            .lock()
            .unwrap()
            .insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let removed = self.attachments.lock().unwrap().remove(&id).is_some();
        if removed {
            self.ticket_attachments
                .lock()
                .unwrap()
                .retain(|(_, attachment_id)| *attachment_id != id);
            self.comment_attachments
                .lock()
                .unwrap()
                .retain(|(_, attachment_id)| *attachment_id != id);
        }
        Ok(removed)
    }

    async fn link_to_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool> {
        Ok(self
            .ticket_attachments
            .lock()
            .unwrap()
            .insert((ticket_id, attachment_id)))
    }

    async fn unlink_from_ticket(&self, attachment_id: i64, ticket_id: i64) -> AppResult<bool> {
        Ok(self
            .ticket_attachments
            .lock()
            .unwrap()
            .remove(&(ticket_id, attachment_id)))
    }

    async fn link_to_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool> {
        Ok(self
            .comment_attachments
            .lock()
            .unwrap()
            .insert((comment_id, attachment_id)))
    }

    async fn unlink_from_comment(&self, attachment_id: i64, comment_id: i64) -> AppResult<bool> {
        Ok(self
            .comment_attachments
            .lock()
            .unwrap()
            .remove(&(comment_id, attachment_id)))
    }
}
