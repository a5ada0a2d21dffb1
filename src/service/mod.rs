//! Application services shared by the HTTP API and the CLI
//!
//! [`ClinicContext`] wires configuration, storage and a clock into the ticket,
//! user and auth services. Both front ends build one context and call into it,
//! so validation, numbering and auditing behave the same everywhere.

mod audit;
mod auth;
mod tickets;
mod users;

pub use audit::AuditLog;
pub use auth::{AuthService, BcryptHasher, Claims, CredentialHasher, LoginResponse, TokenIssuer};
pub use tickets::TicketService;
pub use users::{DEFAULT_ADMIN_USERNAME, NewUser, UserService, UserUpdate};

use crate::config::Config;
use crate::core::{Clock, SystemClock};
use crate::error::Result;
use crate::storage::{self, StorageHandles};
use crate::templates::ReceiptRenderer;
use std::sync::Arc;
use tracing::warn;

/// Everything a request handler or CLI command needs
#[derive(Clone)]
pub struct ClinicContext {
    pub config: Arc<Config>,
    pub tickets: TicketService,
    pub users: UserService,
    pub auth: AuthService,
    pub audit: AuditLog,
    pub receipts: Arc<ReceiptRenderer>,
}

impl ClinicContext {
    /// Build services over already opened storage
    pub fn new(config: Config, storage: StorageHandles, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.auth.uses_default_secret() {
            warn!("Using the built-in token secret; set auth.jwt_secret or CLINIC_AUTH__JWT_SECRET");
        }

        let audit = AuditLog::new(storage.audit);
        let hasher: Arc<dyn CredentialHasher> =
            Arc::new(BcryptHasher::new(config.auth.bcrypt_cost));

        let tickets = TicketService::new(storage.tickets, clock, audit.clone(), &config.tickets);
        let users = UserService::new(storage.users.clone(), hasher.clone(), audit.clone());
        let auth = AuthService::new(
            storage.users,
            hasher,
            TokenIssuer::from_config(&config.auth),
            audit.clone(),
        );
        let receipts = Arc::new(ReceiptRenderer::new(&config.clinic)?);

        Ok(Self {
            config: Arc::new(config),
            tickets,
            users,
            auth,
            audit,
            receipts,
        })
    }

    /// Open the configured storage backend and use the wall clock
    pub async fn open(config: Config) -> Result<Self> {
        let storage = storage::open(&config).await?;
        Self::new(config, storage, Arc::new(SystemClock))
    }
}
