//! Handlers for `ticket` subcommands

use super::parse_day;
use crate::cli::{ExportFormat, IntakeArgs, OutputFormatter, TicketCommands};
use crate::core::validation::parse_status;
use crate::core::{Actor, NumberInput, Ticket, TicketIntake};
use crate::error::Result;
use crate::service::ClinicContext;
use crate::storage::TicketQuery;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub async fn handle_ticket_command(
    command: TicketCommands,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    match command {
        TicketCommands::New(args) => handle_new(args, context, output).await,
        TicketCommands::List {
            status,
            date,
            page,
            limit,
        } => {
            handle_list(
                status.as_deref(),
                date.as_deref(),
                page,
                limit,
                context,
                output,
            )
            .await
        },
        TicketCommands::Show { ticket } => handle_show(&ticket, context, output).await,
        TicketCommands::Status { ticket, status } => {
            handle_status(&ticket, &status, context, output).await
        },
        TicketCommands::Receipt { ticket, output: path } => {
            handle_receipt(&ticket, path.as_deref(), context, output).await
        },
        TicketCommands::Export { format, output: path } => {
            handle_export(format, path, context, output).await
        },
    }
}

/// Map command-line flags onto the intake form the API accepts
pub fn intake_from_args(args: IntakeArgs) -> TicketIntake {
    TicketIntake {
        patient_name: Some(args.name),
        phone_number: Some(args.phone),
        age: args.age.map(NumberInput::from),
        gender: args.gender,
        doctor_name: args.doctor,
        fees: args.fees.map(NumberInput::from),
        reason_for_visit: args.reason,
        appointment_type: args.appointment_type,
        priority: args.priority,
        date_of_birth: args.dob,
        email: args.email,
        address: args.address,
        previous_visit: Some(args.previous_visit),
        insurance_provider: args.insurance_provider,
        insurance_number: args.insurance_number,
        notes: args.notes,
        medicines: args.medicines,
    }
}

async fn handle_new(
    args: IntakeArgs,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let intake = intake_from_args(args);
    let ticket = context
        .tickets
        .create_ticket(&intake, &Actor::local_operator())
        .await?;

    if !output.json(&ticket)? {
        output.success(&format!(
            "Created ticket {} (display number {})",
            ticket.ticket_number,
            ticket.display_number()
        ));
        output.ticket_details(&ticket);
    }
    Ok(())
}

async fn handle_list(
    status: Option<&str>,
    date: Option<&str>,
    page: u32,
    limit: Option<u32>,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let today = context.tickets.allocator().clock().now().date_naive();
    let query = TicketQuery {
        status: status.map(|s| parse_status(Some(s))).transpose()?,
        date: date.map(|d| parse_day(d, today)).transpose()?,
        page,
        limit: limit.unwrap_or(0),
    };
    let result = context.tickets.list(query).await?;

    if output.is_json() {
        return output.print_json(&json!({
            "tickets": result.items,
            "pagination": {
                "page": result.page,
                "limit": result.limit,
                "total": result.total,
                "pages": result.pages(),
            },
        }));
    }

    if result.items.is_empty() {
        output.info("No tickets found");
        return Ok(());
    }
    for ticket in &result.items {
        output.info(&output.ticket_row(ticket));
    }
    output.info(&format!(
        "\nPage {} of {} ({} tickets)",
        result.page,
        result.pages().max(1),
        result.total
    ));
    Ok(())
}

async fn handle_show(
    reference: &str,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let ticket = context.tickets.find(reference).await?;
    if !output.json(&ticket)? {
        output.ticket_details(&ticket);
    }
    Ok(())
}

async fn handle_status(
    reference: &str,
    status: &str,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let status = parse_status(Some(status))?;
    let ticket = context
        .tickets
        .update_status(reference, status, &Actor::local_operator())
        .await?;

    if !output.json(&ticket)? {
        output.success(&format!(
            "Ticket {} is now {}",
            ticket.ticket_number,
            output.status_label(ticket.status)
        ));
    }
    Ok(())
}

async fn handle_receipt(
    reference: &str,
    path: Option<&Path>,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let ticket = context.tickets.find(reference).await?;
    let receipt = context.receipts.render(&ticket)?;

    match path {
        Some(path) => {
            fs::write(path, &receipt)?;
            if !output.json(&json!({
                "ticketNumber": ticket.ticket_number,
                "path": path,
            }))? {
                output.success(&format!("Receipt written to {}", path.display()));
            }
        },
        None => {
            if !output.json(&json!({
                "ticketNumber": ticket.ticket_number,
                "receipt": receipt,
            }))? {
                print!("{receipt}");
            }
        },
    }
    Ok(())
}

async fn handle_export(
    format: ExportFormat,
    path: Option<PathBuf>,
    context: &ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let tickets = context.tickets.all().await?;

    match path {
        Some(path) => {
            let file = fs::File::create(&path)?;
            export_tickets(&tickets, format, io::BufWriter::new(file))?;
            if !output.json(&json!({ "exported": tickets.len(), "path": path }))? {
                output.success(&format!(
                    "Exported {} tickets to {}",
                    tickets.len(),
                    path.display()
                ));
            }
        },
        None => export_tickets(&tickets, format, io::stdout().lock())?,
    }
    Ok(())
}

/// Flat view of a ticket for CSV export
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    id: String,
    ticket_number: &'a str,
    patient_name: &'a str,
    phone_number: &'a str,
    age: Option<u8>,
    gender: Option<String>,
    doctor_name: Option<&'a str>,
    fees: Option<f64>,
    reason_for_visit: Option<&'a str>,
    appointment_type: String,
    priority: String,
    status: &'static str,
    created_by_username: Option<&'a str>,
    created_at: String,
}

impl<'a> From<&'a Ticket> for ExportRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            ticket_number: ticket.ticket_number.as_str(),
            patient_name: &ticket.patient_name,
            phone_number: &ticket.phone_number,
            age: ticket.age,
            gender: ticket.gender.map(|g| g.to_string()),
            doctor_name: ticket.doctor_name.as_deref(),
            fees: ticket.fees,
            reason_for_visit: ticket.reason_for_visit.as_deref(),
            appointment_type: ticket.appointment_type.to_string(),
            priority: ticket.priority.to_string(),
            status: ticket.status.as_str(),
            created_by_username: ticket.created_by_username.as_deref(),
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

/// Write `tickets` to `writer` in the requested format
pub fn export_tickets<W: Write>(
    tickets: &[Ticket],
    format: ExportFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, tickets)?;
            writeln!(writer)?;
        },
        ExportFormat::Yaml => serde_yaml::to_writer(&mut writer, tickets)?,
        ExportFormat::Csv => {
            let mut csv = csv::Writer::from_writer(&mut writer);
            for ticket in tickets {
                csv.serialize(ExportRow::from(ticket))?;
            }
            csv.flush()?;
        },
    }
    writer.flush()?;
    Ok(())
}
