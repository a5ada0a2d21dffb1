//! SQLite storage via sqlx
//!
//! Each record is kept as a JSON document next to the columns that are
//! queried or constrained. `tickets.ticket_number` carries a UNIQUE
//! constraint, which is what rejects a concurrently allocated duplicate.

use super::repository::{AuditRepository, Page, TicketQuery, TicketRepository, UserRepository};
use crate::core::{AuditEntry, Status, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::{ClinicError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tickets (
        id TEXT PRIMARY KEY,
        ticket_number TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        document TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets (created_at)",
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        document TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS audit_log (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        document TEXT NOT NULL
    )",
];

/// Fixed-width UTC timestamp, so text order is time order
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn db_error(e: sqlx::Error) -> ClinicError {
    ClinicError::storage(e)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect and create the schema if needed
    pub async fn connect(url: &str) -> Result<Self> {
        // An in-memory database exists per connection
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;
        let storage = Self { pool };
        storage.migrate().await?;
        debug!("Connected to sqlite at {url}");
        Ok(storage)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }
        Ok(())
    }

    async fn fetch_tickets(&self, sql: &str, binds: &[String]) -> Result<Vec<Ticket>> {
        let mut query = sqlx::query_as::<_, (String,)>(sql);
        for bind in binds {
            query = query.bind(bind);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(|(doc,)| serde_json::from_str(&doc).map_err(ClinicError::from))
            .collect()
    }

    async fn fetch_one_ticket(&self, column: &str, value: String) -> Result<Option<Ticket>> {
        let sql = format!("SELECT document FROM tickets WHERE {column} = ?");
        Ok(self.fetch_tickets(&sql, &[value]).await?.into_iter().next())
    }

    async fn fetch_one_user(&self, column: &str, value: String) -> Result<Option<User>> {
        let sql = format!("SELECT document FROM users WHERE {column} = ?");
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(|(doc,)| serde_json::from_str(&doc).map_err(ClinicError::from))
            .transpose()
    }
}

/// WHERE clause and bind values for a listing query
fn ticket_filter(query: &TicketQuery) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();
    if let Some(status) = query.status {
        clauses.push("status = ?");
        binds.push(status.as_str().to_string());
    }
    if let Some(date) = query.date {
        clauses.push("substr(created_at, 1, 10) = ?");
        binds.push(date.format("%Y-%m-%d").to_string());
    }
    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

#[async_trait]
impl TicketRepository for SqliteStorage {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        let document = serde_json::to_string(&ticket)?;

        sqlx::query(
            "INSERT INTO tickets (id, ticket_number, status, created_at, document) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(ticket.id.to_string())
        .bind(ticket.ticket_number.as_str())
        .bind(ticket.status.as_str())
        .bind(timestamp(&ticket.created_at))
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ClinicError::DuplicateTicketNumber {
                    number: ticket.ticket_number.to_string(),
                }
            } else {
                db_error(e)
            }
        })?;
        Ok(ticket)
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.fetch_one_ticket("id", id.to_string())
            .await?
            .ok_or_else(|| ClinicError::TicketNotFound { id: id.to_string() })
    }

    async fn get_ticket_by_number(&self, number: &TicketNumber) -> Result<Ticket> {
        self.fetch_one_ticket("ticket_number", number.to_string())
            .await?
            .ok_or_else(|| ClinicError::TicketNotFound {
                id: number.to_string(),
            })
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>> {
        let (filter, binds) = ticket_filter(query);

        let count_sql = format!("SELECT COUNT(*) FROM tickets{filter}");
        let mut count = sqlx::query_as::<_, (i64,)>(&count_sql);
        for bind in &binds {
            count = count.bind(bind);
        }
        let (total,) = count.fetch_one(&self.pool).await.map_err(db_error)?;

        let sql = format!(
            "SELECT document FROM tickets{filter} ORDER BY created_at DESC, ticket_number DESC LIMIT {} OFFSET {}",
            query.limit,
            query.offset()
        );
        let items = self.fetch_tickets(&sql, &binds).await?;

        Ok(Page {
            items,
            total: usize::try_from(total).unwrap_or_default(),
            page: query.page.max(1),
            limit: query.limit,
        })
    }

    async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        self.fetch_tickets("SELECT document FROM tickets ORDER BY ticket_number", &[])
            .await
    }

    async fn update_ticket_status(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        let mut ticket = self.get_ticket(id).await?;
        ticket.status = status;
        ticket.updated_at = Utc::now();

        sqlx::query("UPDATE tickets SET status = ?, document = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(serde_json::to_string(&ticket)?)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(ticket)
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(ClinicError::TicketNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn last_ticket_number_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        // GLOB is case-sensitive and matches the prefix literally for [T0-9]
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT ticket_number FROM tickets WHERE ticket_number GLOB ? || '*' ORDER BY ticket_number DESC LIMIT 1",
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(|(number,)| number))
    }
}

#[async_trait]
impl UserRepository for SqliteStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, created_at, document) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(timestamp(&user.created_at))
            .bind(serde_json::to_string(user)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ClinicError::DuplicateUsername {
                        username: user.username.clone(),
                    }
                } else {
                    db_error(e)
                }
            })?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<User> {
        self.fetch_one_user("id", id.to_string())
            .await?
            .ok_or_else(|| ClinicError::UserNotFound { id: id.to_string() })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_one_user("username", username.to_string()).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT document FROM users ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        rows.into_iter()
            .map(|(doc,)| serde_json::from_str(&doc).map_err(ClinicError::from))
            .collect()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query("UPDATE users SET username = ?, document = ? WHERE id = ?")
            .bind(&user.username)
            .bind(serde_json::to_string(user)?)
            .bind(user.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(ClinicError::UserNotFound {
                id: user.id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for SqliteStorage {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        sqlx::query("INSERT INTO audit_log (document) VALUES (?)")
            .bind(serde_json::to_string(entry)?)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT document FROM audit_log ORDER BY seq DESC LIMIT ?")
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        rows.into_iter()
            .map(|(doc,)| serde_json::from_str(&doc).map_err(ClinicError::from))
            .collect()
    }
}
