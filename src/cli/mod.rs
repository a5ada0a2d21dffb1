//! Command-line interface
//!
//! The CLI runs against the same services as the HTTP API. Actions taken from
//! the command line are attributed to the local `console` operator.

pub mod handlers;
pub mod output;

pub use output::OutputFormatter;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Clinic front desk: patient tickets, staff accounts and the REST API
#[derive(Parser, Debug)]
#[command(name = "clinic-desk", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to clinic-desk.yaml in the data directory)
    #[arg(long, global = true, env = "CLINIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory for file and sqlite storage
    #[arg(long, global = true, env = "CLINIC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the REST API server
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Administrative setup
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Create and manage patient tickets
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Manage staff accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Create the administrator account if it does not exist
    Init {
        #[arg(long, default_value = crate::service::DEFAULT_ADMIN_USERNAME)]
        username: String,

        /// Prompted for when omitted
        #[arg(long, env = "CLINIC_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

/// Fields of the patient intake form
#[derive(Args, Debug, Clone, Default)]
pub struct IntakeArgs {
    /// Patient name
    #[arg(long)]
    pub name: String,

    /// Contact phone number
    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub age: Option<f64>,

    /// male, female or other
    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub doctor: Option<String>,

    #[arg(long)]
    pub fees: Option<f64>,

    /// Reason for the visit
    #[arg(long)]
    pub reason: Option<String>,

    /// walk-in, scheduled, emergency or follow-up
    #[arg(long)]
    pub appointment_type: Option<String>,

    /// low, normal, high or urgent
    #[arg(long)]
    pub priority: Option<String>,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    /// The patient has visited before
    #[arg(long)]
    pub previous_visit: bool,

    #[arg(long)]
    pub insurance_provider: Option<String>,

    #[arg(long)]
    pub insurance_number: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long)]
    pub medicines: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// Register a patient and allocate the next ticket number
    New(IntakeArgs),

    /// List tickets, newest first
    List {
        /// pending, in-progress, completed or cancelled
        #[arg(short, long)]
        status: Option<String>,

        /// Creation day: YYYY-MM-DD, today or yesterday (UTC)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (defaults to tickets.default_page_size)
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Show one ticket by number or id
    Show { ticket: String },

    /// Change a ticket's status
    Status { ticket: String, status: String },

    /// Print the receipt for a ticket
    Receipt {
        ticket: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export every ticket
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List staff accounts
    List,

    /// Create a staff account
    Add {
        username: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },

    /// Change role or activation of an account
    Set {
        /// Username or id
        user: String,

        /// admin or staff
        #[arg(long)]
        role: Option<String>,

        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        #[arg(long)]
        deactivate: bool,
    },

    /// Set a new password for an account
    ResetPassword {
        /// Username or id
        user: String,

        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}
