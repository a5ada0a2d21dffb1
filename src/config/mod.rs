//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional
//! `clinic-desk.yaml`, then `CLINIC_`-prefixed environment variables
//! (nested keys separated by `__`, e.g. `CLINIC_SERVER__PORT=8080`).

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the configuration file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "clinic-desk.yaml";

/// Secret used when none is configured
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub tickets: TicketConfig,
    pub clinic: ClinicConfig,
    pub log: LogConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Which storage backend holds tickets, users and audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    /// Connection string for the sqlite backend
    pub sqlite_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: default_data_dir(),
            sqlite_url: None,
        }
    }
}

impl StorageConfig {
    /// Sqlite URL, defaulting to a database file in the data directory
    pub fn sqlite_url(&self) -> String {
        self.sqlite_url.clone().unwrap_or_else(|| {
            format!(
                "sqlite://{}?mode=rwc",
                self.data_dir.join("clinic-desk.db").display()
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24 * 7,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    /// Allocation + insert attempts before a creation is reported as failed
    pub max_allocation_attempts: u32,
    pub default_page_size: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            max_allocation_attempts: 3,
            default_page_size: 50,
        }
    }
}

/// Values printed on receipts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub name: String,
    pub currency: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            name: "Clinic".to_string(),
            currency: "PKR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file plus environment overrides
    ///
    /// Without a path, `clinic-desk.yaml` in the platform data directory is
    /// read if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::build(path, true),
            None => Self::build(&default_data_dir().join(CONFIG_FILE_NAME), false),
        }
    }

    /// Load configuration for a specific data directory
    ///
    /// Reads `clinic-desk.yaml` from that directory when present and pins
    /// `storage.data_dir` to it.
    pub fn load_for_data_dir(data_dir: &Path) -> Result<Self> {
        let mut config = Self::build(&data_dir.join(CONFIG_FILE_NAME), false)?;
        config.storage.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    fn build(file: &Path, required: bool) -> Result<Self> {
        debug!("Loading configuration from {}", file.display());
        let config = config::Config::builder()
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix("CLINIC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Write the configuration as YAML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

/// Platform data directory, or `.clinic-desk` when none can be determined
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("org", "clinic-desk", "clinic-desk").map_or_else(
        || PathBuf::from(".clinic-desk"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.tickets.max_allocation_attempts, 3);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.auth.uses_default_secret());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "server:\n  port: 8081\nstorage:\n  backend: memory\nclinic:\n  name: Ali Maternity Clinic\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.clinic.name, "Ali Maternity Clinic");
        assert_eq!(config.tickets.default_page_size, 50);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "tickets:\n  max_allocation_attempts: 5\n").unwrap();

        // SAFETY: serialized with every other env-mutating test
        unsafe {
            std::env::set_var("CLINIC_TICKETS__MAX_ALLOCATION_ATTEMPTS", "7");
            std::env::set_var("CLINIC_AUTH__JWT_SECRET", "s3cret");
        }
        let config = Config::load(Some(&path));
        unsafe {
            std::env::remove_var("CLINIC_TICKETS__MAX_ALLOCATION_ATTEMPTS");
            std::env::remove_var("CLINIC_AUTH__JWT_SECRET");
        }

        let config = config.unwrap();
        assert_eq!(config.tickets.max_allocation_attempts, 7);
        assert_eq!(config.auth.jwt_secret, "s3cret");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(&temp_dir.path().join("absent.yaml")));
        assert!(matches!(result, Err(e) if e.is_config_error()));
    }

    #[test]
    #[serial]
    fn test_load_for_data_dir_pins_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_for_data_dir(temp_dir.path()).unwrap();
        assert_eq!(config.storage.data_dir, temp_dir.path());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "clinic:\n  currency: USD\n",
        )
        .unwrap();
        let config = Config::load_for_data_dir(temp_dir.path()).unwrap();
        assert_eq!(config.clinic.currency, "USD");
    }

    #[test]
    fn test_save_writes_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = Config::default();
        config.clinic.currency = "USD".to_string();
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("currency: USD"));
    }
}
