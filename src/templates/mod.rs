//! Printable receipts
//!
//! Receipts are plain text rendered with tera, so a clinic can swap in its
//! own layout without touching code.

use crate::config::ClinicConfig;
use crate::core::Ticket;
use crate::error::Result;
use tera::{Context, Tera};

const RECEIPT_TEMPLATE_NAME: &str = "receipt.txt";

/// Built-in receipt layout
pub const DEFAULT_RECEIPT_TEMPLATE: &str = r"{{ clinic_name }}
========================================
Ticket No.     {{ display_number }}
Reference      {{ ticket_number }}
Date           {{ date }}
Time           {{ time }} UTC
----------------------------------------
Patient        {{ patient_name }}
Phone          {{ phone_number }}
{% if age is number %}Age            {{ age }}
{% endif %}{% if doctor_name %}Doctor         {{ doctor_name }}
{% endif %}{% if reason_for_visit %}Reason         {{ reason_for_visit }}
{% endif %}Visit          {{ appointment_type }} / {{ priority }}
----------------------------------------
Fees           {{ fees }}
========================================
";

/// Renders a ticket as a receipt
pub struct ReceiptRenderer {
    tera: Tera,
    clinic_name: String,
    currency: String,
}

impl ReceiptRenderer {
    pub fn new(clinic: &ClinicConfig) -> Result<Self> {
        Self::with_template(clinic, DEFAULT_RECEIPT_TEMPLATE)
    }

    /// Use a custom tera template; it sees the same variables as the default
    pub fn with_template(clinic: &ClinicConfig, source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(RECEIPT_TEMPLATE_NAME, source)?;
        Ok(Self {
            tera,
            clinic_name: clinic.name.clone(),
            currency: clinic.currency.clone(),
        })
    }

    /// `PKR 1500.00`; a missing fee prints as zero
    pub fn format_fees(&self, fees: Option<f64>) -> String {
        format!("{} {:.2}", self.currency, fees.unwrap_or(0.0))
    }

    pub fn render(&self, ticket: &Ticket) -> Result<String> {
        let mut context = Context::new();
        context.insert("clinic_name", &self.clinic_name);
        context.insert("display_number", ticket.display_number());
        context.insert("ticket_number", ticket.ticket_number.as_str());
        context.insert("date", &ticket.created_at.format("%b %-d, %Y").to_string());
        context.insert("time", &ticket.created_at.format("%H:%M").to_string());
        context.insert("patient_name", &ticket.patient_name);
        context.insert("phone_number", &ticket.phone_number);
        context.insert("age", &ticket.age);
        context.insert("doctor_name", &ticket.doctor_name);
        context.insert("reason_for_visit", &ticket.reason_for_visit);
        context.insert("appointment_type", ticket.appointment_type.as_str());
        context.insert("priority", ticket.priority.as_str());
        context.insert("fees", &self.format_fees(ticket.fees));

        Ok(self.tera.render(RECEIPT_TEMPLATE_NAME, &context)?)
    }
}
