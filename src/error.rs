//! Error types for clinic-desk
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`ClinicError`]. The HTTP layer and the CLI both translate these errors
//! into user-facing messages, so variants carry enough context to explain
//! themselves without a backtrace.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ClinicError>;

/// Errors produced by clinic-desk
#[derive(Error, Debug)]
pub enum ClinicError {
    /// I/O failure while touching the data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// A stored value does not parse as a ticket number
    #[error("Invalid ticket number: {0}")]
    InvalidTicketNumber(String),

    #[error("Ticket not found: {id}")]
    TicketNotFound { id: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    /// The store already holds a ticket with this number
    #[error("Ticket number {number} already exists")]
    DuplicateTicketNumber { number: String },

    #[error("A user with this username already exists")]
    DuplicateUsername { username: String },

    /// All 999 sequence slots of a UTC day are in use
    #[error("Daily ticket sequence exhausted for {date}")]
    SequenceExhausted { date: NaiveDate },

    /// Every allocation attempt collided with a concurrent writer
    #[error("Failed to create ticket, please retry")]
    TicketCreationConflict { attempts: u32 },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is deactivated. Please contact administrator.")]
    AccountDeactivated,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("No token provided. Access denied.")]
    MissingToken,

    #[error("Invalid token. Access denied.")]
    InvalidToken,

    #[error("Token expired. Please login again.")]
    TokenExpired,

    #[error("User not found or inactive")]
    InactiveUser,

    /// Authenticated but not allowed to perform the action
    #[error("{0}")]
    Forbidden(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Interactive prompt failed, e.g. no terminal attached
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Failure reported by a storage backend
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

impl ClinicError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a validation error with a message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error with a message
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Message suitable for showing to the person at the front desk
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(e) => format!("File system error: {e}"),
            Self::Config(e) => format!("Failed to load configuration: {e}"),
            Self::TicketCreationConflict { .. } => {
                "Failed to create ticket, please retry".to_string()
            },
            Self::SequenceExhausted { date } => {
                format!("No ticket numbers left for {date}; the daily limit is 999")
            },
            Self::Storage(msg) => format!("Storage error: {msg}"),
            _ => self.to_string(),
        }
    }

    /// Hints for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(_) => vec![
                "Check clinic-desk.yaml in the data directory".to_string(),
                "Environment overrides use the CLINIC_ prefix, e.g. CLINIC_SERVER__PORT".to_string(),
            ],
            Self::TicketCreationConflict { .. } => vec![
                "Another ticket was being created at the same moment; try again".to_string(),
            ],
            Self::InvalidCredentials | Self::TokenExpired | Self::InvalidToken => {
                vec!["Log in again to obtain a fresh token".to_string()]
            },
            Self::AccountDeactivated => {
                vec!["Ask an administrator to reactivate the account".to_string()]
            },
            Self::TicketNotFound { .. } => vec![
                "Use 'clinic-desk ticket list' to see available tickets".to_string(),
                "Tickets can be referenced by number (T20260120001) or id".to_string(),
            ],
            Self::UserNotFound { .. } => {
                vec!["Use 'clinic-desk user list' to see staff accounts".to_string()]
            },
            _ => vec![],
        }
    }

    /// Whether retrying the same request may succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TicketCreationConflict { .. } | Self::DuplicateTicketNumber { .. }
        )
    }

    /// Whether the error stems from configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_recoverable() {
        let err = ClinicError::TicketCreationConflict { attempts: 3 };
        assert!(err.is_recoverable());
        assert_eq!(err.user_message(), "Failed to create ticket, please retry");
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_validation_message_passthrough() {
        let err = ClinicError::validation("Phone number format is invalid");
        assert_eq!(err.to_string(), "Phone number format is invalid");
        assert!(!err.is_recoverable());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_sequence_exhausted_mentions_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let err = ClinicError::SequenceExhausted { date };
        assert!(err.user_message().contains("2026-01-20"));
    }
}
