//! Terminal output for CLI commands
//!
//! Human-readable messages go through `colored`; with `--json` every command
//! prints a single JSON document on stdout and status lines are suppressed.

use crate::core::{Status, Ticket, UserSummary};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    json: bool,
    no_color: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { json, no_color }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub const fn no_color(&self) -> bool {
        self.no_color
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "warning:".yellow().bold());
        }
    }

    /// Errors always go to stderr, even in JSON mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", "error:".red().bold());
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print `value` as JSON when in JSON mode; returns whether it did
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        if self.json {
            self.print_json(value)?;
        }
        Ok(self.json)
    }

    pub fn status_label(&self, status: Status) -> String {
        let label = status.as_str();
        match status {
            Status::Pending => label.yellow().to_string(),
            Status::InProgress => label.blue().to_string(),
            Status::Completed => label.green().to_string(),
            Status::Cancelled => label.dimmed().to_string(),
        }
    }

    /// One line per ticket
    pub fn ticket_row(&self, ticket: &Ticket) -> String {
        format!(
            "{}  {:<12}  {:<24}  {:<14}  {}",
            ticket.ticket_number.as_str().bold(),
            self.status_label(ticket.status),
            ticket.patient_name,
            ticket.phone_number,
            ticket.created_at.format("%Y-%m-%d %H:%M"),
        )
    }

    pub fn ticket_details(&self, ticket: &Ticket) {
        self.info(&format!(
            "{} {}",
            "Ticket".bold(),
            ticket.ticket_number.as_str().bold()
        ));
        self.info(&format!("  Display number: {}", ticket.display_number()));
        self.info(&format!("  Status:         {}", self.status_label(ticket.status)));
        self.info(&format!("  Patient:        {}", ticket.patient_name));
        self.info(&format!("  Phone:          {}", ticket.phone_number));
        if let Some(age) = ticket.age {
            self.info(&format!("  Age:            {age}"));
        }
        if let Some(doctor) = &ticket.doctor_name {
            self.info(&format!("  Doctor:         {doctor}"));
        }
        if let Some(reason) = &ticket.reason_for_visit {
            self.info(&format!("  Reason:         {reason}"));
        }
        self.info(&format!(
            "  Visit:          {} / {}",
            ticket.appointment_type, ticket.priority
        ));
        if let Some(fees) = ticket.fees {
            self.info(&format!("  Fees:           {fees:.2}"));
        }
        if let Some(by) = &ticket.created_by_username {
            self.info(&format!("  Created by:     {by}"));
        }
        self.info(&format!(
            "  Created at:     {}",
            ticket.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    pub fn user_row(&self, user: &UserSummary) -> String {
        let active = if user.is_active {
            "active".green()
        } else {
            "inactive".red()
        };
        format!(
            "{:<20}  {:<6}  {:<8}  {}",
            user.username.bold(),
            user.role,
            active,
            user.id
        )
    }
}
