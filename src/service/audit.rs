use crate::core::{Actor, AuditAction, AuditEntry, AuditResource};
use crate::error::Result;
use crate::storage::AuditRepository;
use std::sync::Arc;
use tracing::warn;

/// Writes audit entries on behalf of the services
///
/// Recording never fails the surrounding operation: by the time an entry is
/// written the change it describes has already been committed.
#[derive(Clone)]
pub struct AuditLog {
    repo: Arc<dyn AuditRepository>,
}

impl AuditLog {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(
        &self,
        actor: Option<&Actor>,
        action: AuditAction,
        resource: AuditResource,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry::new(actor, action, resource, details);
        if let Err(e) = self.repo.append_audit(&entry).await {
            warn!(%action, error = %e, "Failed to write audit entry");
        }
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        self.repo.recent_audit(limit).await
    }
}
