//! YAML document storage in a data directory
//!
//! Layout:
//! - `tickets/<ticket-number>.yaml`, one document per ticket
//! - `users/<user-id>.yaml`, one document per account
//! - `audit.jsonl`, append-only JSON lines
//!
//! Ticket documents are written to a temp file and hard-linked into place.
//! Linking fails when the name exists, so the filesystem itself is the unique
//! index on ticket numbers and holds across processes sharing the directory.
//! The highest number of a day is found from file names alone.

use super::repository::{AuditRepository, Page, TicketQuery, TicketRepository, UserRepository};
use crate::core::{AuditEntry, Status, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::{ClinicError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const TICKETS_DIR: &str = "tickets";
const USERS_DIR: &str = "users";
const AUDIT_FILE: &str = "audit.jsonl";
const DOC_EXT: &str = ".yaml";

/// File-based storage rooted at a data directory
pub struct FileStorage {
    root: PathBuf,
    /// Serializes account writes within this process
    user_lock: Mutex<()>,
    audit_lock: Mutex<()>,
}

impl FileStorage {
    /// Create a handle without touching the disk
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            user_lock: Mutex::new(()),
            audit_lock: Mutex::new(()),
        }
    }

    /// Create a handle and make sure the directory layout exists
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self::new(root);
        storage.ensure_directories().await?;
        Ok(storage)
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.root.join(TICKETS_DIR)).await?;
        fs::create_dir_all(self.root.join(USERS_DIR)).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ticket_path(&self, number: &str) -> PathBuf {
        self.root.join(TICKETS_DIR).join(format!("{number}{DOC_EXT}"))
    }

    fn user_path(&self, id: &UserId) -> PathBuf {
        self.root.join(USERS_DIR).join(format!("{id}{DOC_EXT}"))
    }

    /// Document stems (file names without extension) in a subdirectory
    async fn document_stems(&self, dir: &str) -> Result<Vec<String>> {
        let mut stems = Vec::new();
        let mut entries = match fs::read_dir(self.root.join(dir)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stems),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(stem) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_suffix(DOC_EXT))
            {
                stems.push(stem.to_string());
            }
        }
        Ok(stems)
    }

    async fn read_doc<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Sibling temp path unique to one write
    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()))
    }

    /// Write `content` to a fresh temp file next to `path`
    async fn write_temp(path: &Path, content: &str) -> Result<PathBuf> {
        let tmp = Self::temp_path(path);
        if let Err(e) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(tmp)
    }

    /// Replace a document via write-to-temp and rename
    async fn replace_doc<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let tmp = Self::write_temp(path, &serde_yaml::to_string(value)?).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn load_all_tickets(&self) -> Result<Vec<Ticket>> {
        let mut stems = self.document_stems(TICKETS_DIR).await?;
        stems.sort();
        let mut tickets = Vec::with_capacity(stems.len());
        for stem in stems {
            match Self::read_doc::<Ticket>(&self.ticket_path(&stem)).await {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => warn!("Skipping unreadable ticket document {stem}: {e}"),
            }
        }
        Ok(tickets)
    }

    async fn load_all_users(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();
        for stem in self.document_stems(USERS_DIR).await? {
            let path = self.root.join(USERS_DIR).join(format!("{stem}{DOC_EXT}"));
            match Self::read_doc::<User>(&path).await {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping unreadable user document {stem}: {e}"),
            }
        }
        Ok(users)
    }
}

fn not_found(id: impl ToString) -> ClinicError {
    ClinicError::TicketNotFound { id: id.to_string() }
}

#[async_trait]
impl TicketRepository for FileStorage {
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket> {
        let number = ticket.ticket_number.as_str().to_string();
        let content = serde_yaml::to_string(&ticket)?;

        // Readers only ever see a complete document under the ticket's name
        let path = self.ticket_path(&number);
        let tmp = Self::write_temp(&path, &content).await?;
        let linked = fs::hard_link(&tmp, &path).await;
        if let Err(e) = fs::remove_file(&tmp).await {
            warn!("Could not remove temp file {}: {e}", tmp.display());
        }
        match linked {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ClinicError::DuplicateTicketNumber { number });
            },
            Err(e) => return Err(e.into()),
        }

        debug!("Stored ticket {number} at {}", path.display());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.load_all_tickets()
            .await?
            .into_iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| not_found(id))
    }

    async fn get_ticket_by_number(&self, number: &TicketNumber) -> Result<Ticket> {
        match Self::read_doc(&self.ticket_path(number.as_str())).await {
            Err(ClinicError::Io(e)) if e.kind() == ErrorKind::NotFound => Err(not_found(number)),
            other => other,
        }
    }

    async fn list_tickets(&self, query: &TicketQuery) -> Result<Page<Ticket>> {
        let mut matching: Vec<Ticket> = self
            .load_all_tickets()
            .await?
            .into_iter()
            .filter(|t| query.matches(t))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.ticket_number.cmp(&a.ticket_number))
        });
        Ok(Page::from_sorted(matching, query))
    }

    async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        self.load_all_tickets().await
    }

    async fn update_ticket_status(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        let mut ticket = self.get_ticket(id).await?;
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Self::replace_doc(&self.ticket_path(ticket.ticket_number.as_str()), &ticket).await?;
        Ok(ticket)
    }

    async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let ticket = self.get_ticket(id).await?;
        fs::remove_file(self.ticket_path(ticket.ticket_number.as_str())).await?;
        Ok(())
    }

    async fn last_ticket_number_with_prefix(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .document_stems(TICKETS_DIR)
            .await?
            .into_iter()
            .filter(|stem| stem.starts_with(prefix))
            .max())
    }
}

#[async_trait]
impl UserRepository for FileStorage {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.user_lock.lock().await;
        if self.find_user_by_username(&user.username).await?.is_some() {
            return Err(ClinicError::DuplicateUsername {
                username: user.username.clone(),
            });
        }
        Self::replace_doc(&self.user_path(&user.id), user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<User> {
        match Self::read_doc(&self.user_path(id)).await {
            Err(ClinicError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(ClinicError::UserNotFound { id: id.to_string() })
            },
            other => other,
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .load_all_users()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users = self.load_all_users().await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let _guard = self.user_lock.lock().await;
        self.get_user(&user.id).await?;
        Self::replace_doc(&self.user_path(&user.id), user).await
    }
}

#[async_trait]
impl AuditRepository for FileStorage {
    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.audit_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(AUDIT_FILE))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn recent_audit(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let content = match fs::read_to_string(self.root.join(AUDIT_FILE)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .take(limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuditAction, AuditResource, Role};
    use crate::test_utils::TestDataDir;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, FileStorage) {
        let data = TestDataDir::new().await;
        (data.temp_dir, data.storage)
    }

    fn ticket(number: &str) -> Ticket {
        Ticket::new(number.parse().unwrap(), "Patient".to_string(), "0300 1234567".to_string())
    }

    #[tokio::test]
    async fn test_ticket_repository_save_and_load() {
        let (_dir, storage) = storage().await;
        let stored = storage.insert_ticket(ticket("T20260120001")).await.unwrap();

        let loaded = storage.get_ticket(&stored.id).await.unwrap();
        assert_eq!(loaded, stored);

        let by_number = storage
            .get_ticket_by_number(&stored.ticket_number)
            .await
            .unwrap();
        assert_eq!(by_number.id, stored.id);
        assert!(
            storage
                .root()
                .join("tickets")
                .join("T20260120001.yaml")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_create_new_enforces_unique_number() {
        let (_dir, storage) = storage().await;
        let first = storage.insert_ticket(ticket("T20260120001")).await.unwrap();
        let err = storage.insert_ticket(ticket("T20260120001")).await.unwrap_err();
        assert!(matches!(err, ClinicError::DuplicateTicketNumber { .. }));

        // The stored document is untouched
        let loaded = storage
            .get_ticket_by_number(&first.ticket_number)
            .await
            .unwrap();
        assert_eq!(loaded.id, first.id);
    }

    #[tokio::test]
    async fn test_uniqueness_holds_across_handles() {
        let (_dir, storage) = storage().await;
        let other = FileStorage::new(storage.root().to_path_buf());
        storage.insert_ticket(ticket("T20260120001")).await.unwrap();
        assert!(other.insert_ticket(ticket("T20260120001")).await.is_err());
        assert_eq!(
            other.last_ticket_number_with_prefix("T20260120").await.unwrap(),
            Some("T20260120001".to_string())
        );
    }

    #[tokio::test]
    async fn test_last_number_ignores_temp_and_other_days() {
        let (_dir, storage) = storage().await;
        storage.insert_ticket(ticket("T20260120002")).await.unwrap();
        storage.insert_ticket(ticket("T20260121001")).await.unwrap();
        std::fs::write(storage.ticket_path("T20260120009").with_extension("yaml.tmp"), "").unwrap();

        assert_eq!(
            storage.last_ticket_number_with_prefix("T20260120").await.unwrap(),
            Some("T20260120002".to_string())
        );
    }

    #[tokio::test]
    async fn test_status_update_and_delete() {
        let (_dir, storage) = storage().await;
        let stored = storage.insert_ticket(ticket("T20260120001")).await.unwrap();

        let updated = storage
            .update_ticket_status(&stored.id, Status::InProgress)
            .await
            .unwrap();
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(
            storage.get_ticket(&stored.id).await.unwrap().status,
            Status::InProgress
        );

        storage.delete_ticket(&stored.id).await.unwrap();
        assert!(matches!(
            storage.get_ticket_by_number(&stored.ticket_number).await,
            Err(ClinicError::TicketNotFound { .. })
        ));
    }

    fn leftover_temp_files(storage: &FileStorage) -> Vec<String> {
        std::fs::read_dir(storage.root().join("tickets"))
            .unwrap()
            .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[tokio::test]
    async fn test_rejected_insert_leaves_no_files() {
        let (_dir, storage) = storage().await;
        storage.insert_ticket(ticket("T20260120001")).await.unwrap();
        storage.insert_ticket(ticket("T20260120001")).await.unwrap_err();

        assert!(leftover_temp_files(&storage).is_empty());
        assert_eq!(storage.all_tickets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_publishes_no_document() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.insert_ticket(ticket("T20260120001")).await.unwrap_err();

        storage.ensure_directories().await.unwrap();
        assert_eq!(storage.last_ticket_number_with_prefix("T20260120").await.unwrap(), None);
        assert!(leftover_temp_files(&storage).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_status_updates_on_one_ticket() {
        let (_dir, storage) = storage().await;
        let storage = std::sync::Arc::new(storage);
        let stored = storage.insert_ticket(ticket("T20260120001")).await.unwrap();

        for _ in 0..25 {
            let mut handles = Vec::new();
            for n in 0..8 {
                let storage = storage.clone();
                let id = stored.id.clone();
                let status = if n % 2 == 0 { Status::InProgress } else { Status::Completed };
                handles.push(tokio::spawn(async move {
                    storage.update_ticket_status(&id, status).await
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        }

        let loaded = storage.get_ticket(&stored.id).await.unwrap();
        assert!(matches!(loaded.status, Status::InProgress | Status::Completed));
        assert!(leftover_temp_files(&storage).is_empty());
    }

    #[tokio::test]
    async fn test_users_and_audit() {
        let (_dir, storage) = storage().await;
        let user = User::new("admin".to_string(), "hash".to_string(), Role::Admin);
        storage.insert_user(&user).await.unwrap();
        assert!(storage.insert_user(&user).await.is_err());
        assert_eq!(storage.get_user(&user.id).await.unwrap().username, "admin");
        assert!(matches!(
            storage.get_user(&UserId::new()).await,
            Err(ClinicError::UserNotFound { .. })
        ));

        storage
            .append_audit(&AuditEntry::new(
                None,
                AuditAction::CreateUser,
                AuditResource::User,
                serde_json::json!({ "createdUsername": "admin" }),
            ))
            .await
            .unwrap();
        let recent = storage.recent_audit(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].details["createdUsername"], "admin");
    }
}
