use crate::core::{AuditEntry, Status, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

/// Filter and paging for ticket listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    pub status: Option<Status>,
    /// UTC calendar day of `created_at`
    pub date: Option<NaiveDate>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            status: None,
            date: None,
            page: 1,
            limit: 50,
        }
    }
}

impl TicketQuery {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.status.is_none_or(|s| ticket.status == s)
            && self.date.is_none_or(|d| ticket.created_at.date_naive() == d)
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit as usize
    }
}

/// One page of results plus the unpaged total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        u32::try_from(self.total.div_ceil(self.limit as usize)).unwrap_or(u32::MAX)
    }

    /// Sort-then-slice helper for backends that filter in memory
    pub fn from_sorted(items: Vec<T>, query: &TicketQuery) -> Self {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .collect();
        Self {
            items,
            total,
            page: query.page.max(1),
            limit: query.limit,
        }
    }
}

/// Repository trait for ticket storage operations
///
/// Every implementation must enforce uniqueness of ticket numbers at insert
/// time and report a clash as
/// [`ClinicError::DuplicateTicketNumber`](crate::error::ClinicError::DuplicateTicketNumber).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persists a new ticket as given
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket>;

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket>;

    async fn get_ticket_by_number(&self, number: &TicketNumber) -> Result<Ticket>;

    /// Matching tickets, newest first
    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>>;

    /// Every stored ticket ordered by ticket number
    async fn all_tickets(&self) -> Result<Vec<Ticket>>;

    async fn update_ticket_status(&self, id: &TicketId, status: Status) -> Result<Ticket>;

    async fn delete_ticket(&self, id: &TicketId) -> Result<()>;

    /// Highest stored ticket number starting with `prefix`, compared as strings
    async fn last_ticket_number_with_prefix(&self, prefix: &str) -> Result<Option<String>>;
}

/// Repository trait for staff accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateUsername` when the username is taken
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, id: &UserId) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All accounts, newest first
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Replaces the stored account with the same id
    async fn update_user(&self, user: &User) -> Result<()>;
}

/// Append-only audit trail
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()>;

    /// Most recent entries first
    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>>;
}

/// Combined repository trait
pub trait Repository: TicketRepository + UserRepository + AuditRepository {}

/// Implementation of Repository for types that implement all three traits
impl<T> Repository for T where T: TicketRepository + UserRepository + AuditRepository {}
