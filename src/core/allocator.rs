//! Daily ticket-number allocation
//!
//! The next number is derived from the highest number already stored for the
//! current UTC day; there is no separate counter. Allocation is a plain read,
//! so two concurrent callers can compute the same number. The store's unique
//! index on ticket numbers rejects the second insert, and the creation flow in
//! [`crate::service::TicketService`] re-allocates and retries on that error.

use super::TicketNumber;
use crate::error::Result;
use crate::storage::TicketRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Source of "now" for allocation
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock, used to pin or advance the allocation date
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Sequence that follows `last`, the highest number stored for the day
///
/// A missing, non-numeric or zero trailing segment restarts at 1. That path
/// is logged because it can hand out a number that is already taken; the
/// insert then fails on the unique index instead of corrupting data.
pub fn next_sequence(last: Option<&str>) -> u32 {
    let Some(last) = last else {
        return 1;
    };

    let parsed = last
        .len()
        .checked_sub(3)
        .and_then(|start| last.get(start..))
        .filter(|suffix| suffix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|suffix| suffix.parse::<u32>().ok());

    match parsed {
        Some(sequence) if sequence > 0 => sequence + 1,
        _ => {
            warn!(
                last_ticket_number = last,
                "Stored ticket number has no usable sequence, restarting at 001"
            );
            1
        },
    }
}

/// One-shot allocation against `tickets` for the day `clock` reports
///
/// Every call re-reads the store, so repeated calls without an insert in
/// between return the same number.
pub async fn allocate_ticket_number(
    tickets: &dyn TicketRepository,
    clock: &dyn Clock,
) -> Result<TicketNumber> {
    number_for_day(tickets, clock.now()).await
}

async fn number_for_day(
    tickets: &dyn TicketRepository,
    now: DateTime<Utc>,
) -> Result<TicketNumber> {
    let date = now.date_naive();
    let prefix = TicketNumber::date_prefix(date);

    let last = tickets.last_ticket_number_with_prefix(&prefix).await?;
    let sequence = next_sequence(last.as_deref());
    let number = TicketNumber::new(date, sequence)?;

    debug!(
        last = last.as_deref().unwrap_or("-"),
        allocated = %number,
        "Allocated ticket number"
    );
    Ok(number)
}

/// Computes the next ticket number for the clock's current UTC day
#[derive(Clone)]
pub struct TicketNumberAllocator {
    tickets: Arc<dyn TicketRepository>,
    clock: Arc<dyn Clock>,
}

impl TicketNumberAllocator {
    pub fn new(tickets: Arc<dyn TicketRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { tickets, clock }
    }

    /// Next number for today; re-reads the store on every call
    pub async fn allocate(&self) -> Result<TicketNumber> {
        self.allocate_at(self.clock.now()).await
    }

    /// Next number for the UTC day containing `now`
    pub async fn allocate_at(&self, now: DateTime<Utc>) -> Result<TicketNumber> {
        number_for_day(self.tickets.as_ref(), now).await
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
