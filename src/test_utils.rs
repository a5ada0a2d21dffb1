//! Test utilities for clinic-desk
//!
//! Shared fixtures for unit tests: an in-memory clinic on a pinned clock and
//! a temporary data directory for the file backend.

#![cfg(test)]

use crate::config::{Config, StorageBackend};
use crate::core::{Actor, FixedClock, NumberInput, TicketIntake};
use crate::service::ClinicContext;
use crate::storage::{FileStorage, MemoryStorage, StorageHandles};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

/// Password used for every fixture account
pub const TEST_PASSWORD: &str = "correct-horse";

/// 2024-03-15 09:30 UTC
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

/// Configuration for fast tests: memory backend and the cheapest bcrypt cost
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config.auth.bcrypt_cost = 4;
    config.auth.jwt_secret = "test-secret".to_string();
    config
}

/// In-memory clinic whose clock the test controls
pub struct TestClinic {
    pub context: ClinicContext,
    pub clock: Arc<FixedClock>,
    pub storage: Arc<MemoryStorage>,
}

impl TestClinic {
    pub fn new() -> Self {
        Self::at(morning())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(FixedClock::new(now));
        let context = ClinicContext::new(
            test_config(),
            StorageHandles::from_backend(storage.clone()),
            clock.clone(),
        )
        .expect("Failed to build test context");
        Self {
            context,
            clock,
            storage,
        }
    }

    /// Create the admin account and return it as an actor
    pub async fn admin(&self) -> Actor {
        let user = self
            .context
            .users
            .bootstrap_admin("admin", TEST_PASSWORD)
            .await
            .expect("Failed to create admin")
            .expect("Admin already exists");
        Actor::new(user.id, user.username, user.role)
    }
}

/// Temporary data directory with an opened file backend
pub struct TestDataDir {
    pub temp_dir: TempDir,
    pub storage: FileStorage,
}

impl TestDataDir {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = FileStorage::open(temp_dir.path())
            .await
            .expect("Failed to open file storage");
        Self { temp_dir, storage }
    }
}

/// Intake with the fields front-desk staff usually fill in
pub fn sample_intake(name: &str) -> TicketIntake {
    TicketIntake {
        age: Some(NumberInput::from(34.0)),
        gender: Some("female".to_string()),
        doctor_name: Some("Dr. Rehman".to_string()),
        fees: Some(NumberInput::from(1500.0)),
        reason_for_visit: Some("Fever".to_string()),
        ..TicketIntake::new(name, "0300 1234567")
    }
}
