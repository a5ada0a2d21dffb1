//! clinic-desk - clinic front-desk service
//!
//! This is the main entry point for the clinic-desk CLI application.
//! It parses arguments, loads configuration, opens storage and dispatches to
//! the command handlers.

use clap::Parser;
use clinic_desk::cli::handlers::{
    handle_admin_command, handle_serve, handle_ticket_command, handle_user_command,
};
use clinic_desk::cli::{Cli, Commands, OutputFormatter};
use clinic_desk::config::Config;
use clinic_desk::error::{ClinicError, Result};
use clinic_desk::service::ClinicContext;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter).await {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Load configuration, set up logging and run the requested command
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(&cli)?;
    init_tracing(cli.verbose, &config.log.level);

    let context = ClinicContext::open(config).await?;
    dispatch_command(cli.command, context, formatter).await
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match (&cli.config, &cli.data_dir) {
        (Some(path), _) => Config::load(Some(path.as_path()))?,
        (None, Some(dir)) => Config::load_for_data_dir(dir)?,
        (None, None) => Config::load(None)?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }
    Ok(config)
}

/// Logs go to stderr so `--json` output on stdout stays parseable
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch_command(
    command: Commands,
    context: ClinicContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    match command {
        Commands::Serve { host, port } => handle_serve(host, port, context, formatter).await,
        Commands::Admin { command } => handle_admin_command(command, &context, formatter).await,
        Commands::Ticket { command } => handle_ticket_command(command, &context, formatter).await,
        Commands::User { command } => handle_user_command(command, &context, formatter).await,
    }
}

/// Print an error with its suggestions, as JSON when `--json` is set
fn handle_error(error: &ClinicError, formatter: &OutputFormatter) {
    if formatter.is_json() {
        let body = serde_json::json!({
            "success": false,
            "error": error.user_message(),
            "suggestions": error.suggestions(),
        });
        if formatter.print_json(&body).is_ok() {
            return;
        }
    }

    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        eprintln!("\nSuggestions:");
        for suggestion in &suggestions {
            eprintln!("  • {suggestion}");
        }
    }

    if error.is_config_error() {
        eprintln!("\nRun with --verbose for more detail.");
    }
}
