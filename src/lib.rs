//! clinic-desk - front-desk service for a small clinic
//!
//! Staff sign in, register patient visits as tickets and track each visit
//! through `pending → in-progress → completed`. Every ticket gets a
//! human-readable number of the form `T<YYYYMMDD><NNN>` that restarts at
//! `001` each UTC day.
//!
//! The crate is split into:
//! - [`core`]: domain types, intake validation and the ticket-number allocator
//! - [`storage`]: repository traits with in-memory, YAML-file and sqlite backends
//! - [`service`]: tickets, accounts, authentication and the audit trail
//! - [`api`]: the axum REST API (feature `api`)
//! - [`cli`]: the `clinic-desk` command line
//!
//! # Ticket numbering under concurrency
//!
//! Numbers are derived from the highest number already stored for the day.
//! Two concurrent creations may compute the same number; the store rejects
//! the second insert as a duplicate and the creation flow allocates again,
//! up to `tickets.max_allocation_attempts` times.
//!
//! # Example
//!
//! ```rust,ignore
//! use clinic_desk::config::Config;
//! use clinic_desk::core::{Actor, TicketIntake};
//! use clinic_desk::service::ClinicContext;
//!
//! let context = ClinicContext::open(Config::default()).await?;
//! let ticket = context
//!     .tickets
//!     .create_ticket(&TicketIntake::new("Amina Bibi", "03001234567"), &Actor::local_operator())
//!     .await?;
//! println!("{}", ticket.ticket_number); // T20240315001
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::map_unwrap_or)]

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod storage;
pub mod templates;

#[cfg(test)]
pub mod test_utils;

pub use error::{ClinicError, Result};
