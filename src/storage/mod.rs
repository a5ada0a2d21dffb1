//! Persistence for tickets, staff accounts and the audit trail
//!
//! Three backends implement the repository traits:
//! - [`MemoryStorage`]: process-local maps, for tests and throwaway runs
//! - [`FileStorage`]: YAML documents under the data directory (default)
//! - `SqliteStorage`: sqlx-backed database, behind the `database` feature
//!
//! All of them reject a second ticket with an existing number, which the
//! ticket service relies on to resolve concurrent allocations.

mod file;
mod memory;
mod repository;
#[cfg(feature = "database")]
mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use repository::{
    AuditRepository, Page, Repository, TicketQuery, TicketRepository, UserRepository,
};
#[cfg(feature = "database")]
pub use sqlite::SqliteStorage;

#[cfg(test)]
pub use repository::{MockTicketRepository, MockUserRepository};

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// One backend seen through each of its repository traits
#[derive(Clone)]
pub struct StorageHandles {
    pub tickets: Arc<dyn TicketRepository>,
    pub users: Arc<dyn UserRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl StorageHandles {
    pub fn from_backend<S: Repository + 'static>(backend: Arc<S>) -> Self {
        Self {
            tickets: backend.clone(),
            users: backend.clone(),
            audit: backend,
        }
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStorage::new()))
    }
}

/// Open the backend selected in the configuration
pub async fn open(config: &Config) -> Result<StorageHandles> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on exit");
            Ok(StorageHandles::memory())
        },
        StorageBackend::File => {
            let storage = FileStorage::open(&config.storage.data_dir).await?;
            info!("Using file storage at {}", storage.root().display());
            Ok(StorageHandles::from_backend(Arc::new(storage)))
        },
        #[cfg(feature = "database")]
        StorageBackend::Sqlite => {
            tokio::fs::create_dir_all(&config.storage.data_dir).await?;
            let storage = SqliteStorage::connect(&config.storage.sqlite_url()).await?;
            info!("Using sqlite storage");
            Ok(StorageHandles::from_backend(Arc::new(storage)))
        },
        #[cfg(not(feature = "database"))]
        StorageBackend::Sqlite => Err(crate::error::ClinicError::custom(
            "The sqlite backend requires building with the `database` feature",
        )),
    }
}
