//! Core domain types
//!
//! Tickets, staff users, audit entries and the daily ticket-number
//! allocator. Nothing in here performs I/O directly; persistence goes through
//! the traits in [`crate::storage`].

mod allocator;
mod audit;
mod builders;
mod ticket;
mod ticket_number;
mod user;
pub mod validation;

pub use allocator::{
    Clock, FixedClock, SystemClock, TicketNumberAllocator, allocate_ticket_number, next_sequence,
};
pub use audit::{Actor, AuditAction, AuditEntry, AuditResource};
pub use builders::TicketBuilder;
pub use ticket::{
    AppointmentType, Gender, NumberInput, Priority, Status, Ticket, TicketId, TicketIntake,
};
pub use ticket_number::TicketNumber;
pub use user::{Role, User, UserId, UserSummary};
