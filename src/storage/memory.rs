//! In-process storage backend
//!
//! Each map sits behind one async `RwLock`. A lookup and a later insert are
//! separate lock acquisitions, so concurrent ticket creation can interleave
//! exactly as it would against an external database; the `numbers` index
//! is what rejects the losing insert.

use super::repository::{AuditRepository, Page, TicketQuery, TicketRepository, UserRepository};
use crate::core::{AuditEntry, Status, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::{ClinicError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tokio::sync::RwLock;

#[derive(Default)]
struct TicketTable {
    by_id: HashMap<TicketId, Ticket>,
    /// Unique index on ticket number
    numbers: BTreeMap<String, TicketId>,
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
}

/// Volatile storage for tests and single-process deployments
#[derive(Default)]
pub struct MemoryStorage {
    tickets: RwLock<TicketTable>,
    users: RwLock<UserTable>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for MemoryStorage {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        let mut table = self.tickets.write().await;
        let number = ticket.ticket_number.as_str().to_string();
        if table.numbers.contains_key(&number) {
            return Err(ClinicError::DuplicateTicketNumber { number });
        }

        table.numbers.insert(number, ticket.id.clone());
        table.by_id.insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.tickets
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ClinicError::TicketNotFound { id: id.to_string() })
    }

    async fn get_ticket_by_number(&self, number: &TicketNumber) -> Result<Ticket> {
        let table = self.tickets.read().await;
        table
            .numbers
            .get(number.as_str())
            .and_then(|id| table.by_id.get(id))
            .cloned()
            .ok_or_else(|| ClinicError::TicketNotFound {
                id: number.to_string(),
            })
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>> {
        let table = self.tickets.read().await;
        let mut matching: Vec<Ticket> = table
            .by_id
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.ticket_number.cmp(&a.ticket_number))
        });
        Ok(Page::from_sorted(matching, query))
    }

    async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        let table = self.tickets.read().await;
        Ok(table
            .numbers
            .values()
            .filter_map(|id| table.by_id.get(id))
            .cloned()
            .collect())
    }

    async fn update_ticket_status(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        let mut table = self.tickets.write().await;
        let ticket = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| ClinicError::TicketNotFound { id: id.to_string() })?;
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let mut table = self.tickets.write().await;
        let ticket = table
            .by_id
            .remove(id)
            .ok_or_else(|| ClinicError::TicketNotFound { id: id.to_string() })?;
        table.numbers.remove(ticket.ticket_number.as_str());
        Ok(())
    }

    async fn last_ticket_number_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let table = self.tickets.read().await;
        Ok(table
            .numbers
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(number, _)| number.starts_with(prefix))
            .last()
            .map(|(number, _)| number.clone()))
    }
}

#[async_trait]
impl UserRepository for MemoryStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut table = self.users.write().await;
        if table.usernames.contains_key(&user.username) {
            return Err(ClinicError::DuplicateUsername {
                username: user.username.clone(),
            });
        }
        table.usernames.insert(user.username.clone(), user.id.clone());
        table.by_id.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<User> {
        self.users
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ClinicError::UserNotFound { id: id.to_string() })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let table = self.users.read().await;
        Ok(table
            .usernames
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.by_id.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut table = self.users.write().await;
        let stored = table
            .by_id
            .get_mut(&user.id)
            .ok_or_else(|| ClinicError::UserNotFound {
                id: user.id.to_string(),
            })?;
        *stored = user.clone();
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for MemoryStorage {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.audit.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
