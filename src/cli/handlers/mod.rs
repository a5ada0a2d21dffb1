//! Command handlers
//!
//! Each submodule handles one top-level command. Handlers receive the opened
//! [`ClinicContext`](crate::service::ClinicContext) and act as the local
//! console operator.

mod admin;
mod date_filter;
mod serve;
mod ticket;
mod user;

pub use admin::handle_admin_command;
pub use date_filter::parse_day;
pub use serve::handle_serve;
pub use ticket::{export_tickets, handle_ticket_command, intake_from_args};
pub use user::handle_user_command;

use crate::error::Result;
use dialoguer::Password;

/// Use the given password or ask for one twice on the terminal
fn password_or_prompt(password: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let password = Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    Ok(password)
}
