use super::AuditLog;
use crate::config::TicketConfig;
use crate::core::validation::validate_intake;
use crate::core::{
    Actor, AuditAction, AuditResource, Clock, Status, Ticket, TicketBuilder, TicketId,
    TicketIntake, TicketNumber, TicketNumberAllocator,
};
use crate::error::{ClinicError, Result};
use crate::storage::{Page, TicketQuery, TicketRepository};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Ticket intake, lookup and status changes
#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    allocator: TicketNumberAllocator,
    audit: AuditLog,
    max_attempts: u32,
    default_page_size: u32,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        clock: Arc<dyn Clock>,
        audit: AuditLog,
        config: &TicketConfig,
    ) -> Self {
        Self {
            allocator: TicketNumberAllocator::new(tickets.clone(), clock),
            tickets,
            audit,
            max_attempts: config.max_allocation_attempts.max(1),
            default_page_size: config.default_page_size.max(1),
        }
    }

    pub const fn allocator(&self) -> &TicketNumberAllocator {
        &self.allocator
    }

    /// Validate an intake form, number it and persist it
    pub async fn create_ticket(&self, intake: &TicketIntake, actor: &Actor) -> Result<Ticket> {
        let builder = validate_intake(intake)?
            .created_by(actor.user_id.clone(), actor.username.clone());
        let ticket = self.insert_numbered(builder).await?;

        info!(
            ticket_number = %ticket.ticket_number,
            id = %ticket.id.short(),
            created_by = %actor.username,
            "Created ticket"
        );
        self.audit
            .record(
                Some(actor),
                AuditAction::CreateTicket,
                AuditResource::Ticket,
                json!({
                    "ticketId": ticket.id,
                    "ticketNumber": ticket.ticket_number,
                    "patientName": ticket.patient_name,
                }),
            )
            .await;
        Ok(ticket)
    }

    /// Allocate and insert, allocating again whenever the store reports that
    /// a concurrent writer took the number first
    async fn insert_numbered(&self, builder: TicketBuilder) -> Result<Ticket> {
        for attempt in 1..=self.max_attempts {
            let now = self.allocator.clock().now();
            let number = self.allocator.allocate_at(now).await?;
            let ticket = builder.clone().created_at(now).build(number);

            match self.tickets.insert_ticket(ticket).await {
                Ok(stored) => return Ok(stored),
                Err(ClinicError::DuplicateTicketNumber { number }) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        %number,
                        "Ticket number already taken, allocating again"
                    );
                },
                Err(e) => return Err(e),
            }
        }

        Err(ClinicError::TicketCreationConflict {
            attempts: self.max_attempts,
        })
    }

    /// Matching tickets, newest first; a zero limit means the configured page size
    pub async fn list(&self, mut query: TicketQuery) -> Result<Page<Ticket>> {
        if query.limit == 0 {
            query.limit = self.default_page_size;
        }
        query.page = query.page.max(1);
        self.tickets.list_tickets(&query).await
    }

    pub async fn get(&self, id: &TicketId) -> Result<Ticket> {
        self.tickets.get_ticket(id).await
    }

    /// Look a ticket up by its number (`T20260120001`) or by its id
    pub async fn find(&self, reference: &str) -> Result<Ticket> {
        let reference = reference.trim();
        if let Ok(number) = TicketNumber::parse(reference) {
            return self.tickets.get_ticket_by_number(&number).await;
        }
        let id = TicketId::parse_str(reference).map_err(|_| ClinicError::TicketNotFound {
            id: reference.to_string(),
        })?;
        self.tickets.get_ticket(&id).await
    }

    /// Every ticket in ticket-number order
    pub async fn all(&self) -> Result<Vec<Ticket>> {
        self.tickets.all_tickets().await
    }

    pub async fn update_status(
        &self,
        reference: &str,
        status: Status,
        actor: &Actor,
    ) -> Result<Ticket> {
        let ticket = self.find(reference).await?;
        let updated = self.tickets.update_ticket_status(&ticket.id, status).await?;

        info!(
            ticket_number = %updated.ticket_number,
            from = %ticket.status,
            to = %status,
            "Updated ticket status"
        );
        self.audit
            .record(
                Some(actor),
                AuditAction::UpdateTicketStatus,
                AuditResource::Ticket,
                json!({
                    "ticketId": updated.id,
                    "ticketNumber": updated.ticket_number,
                    "status": status,
                }),
            )
            .await;
        Ok(updated)
    }
}
