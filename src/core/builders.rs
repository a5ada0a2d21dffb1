use super::{
    AppointmentType, Gender, Priority, Status, Ticket, TicketId, TicketNumber, UserId,
};
use chrono::{DateTime, NaiveDate, Utc};

/// Builder for creating Ticket instances
///
/// Everything except the ticket number can be set up front; the number is
/// supplied to [`TicketBuilder::build`] because it is allocated at the last
/// moment before the ticket is persisted, and re-allocated on retry.
#[derive(Debug, Clone, Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    patient_name: String,
    phone_number: String,
    age: Option<u8>,
    gender: Option<Gender>,
    doctor_name: Option<String>,
    fees: Option<f64>,
    reason_for_visit: Option<String>,
    appointment_type: Option<AppointmentType>,
    priority: Option<Priority>,
    date_of_birth: Option<NaiveDate>,
    email: Option<String>,
    address: Option<String>,
    previous_visit: bool,
    insurance_provider: Option<String>,
    insurance_number: Option<String>,
    notes: Option<String>,
    medicines: Option<String>,
    status: Option<Status>,
    created_by: Option<UserId>,
    created_by_username: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = name.into();
        self
    }

    #[must_use]
    pub fn phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = phone.into();
        self
    }

    #[must_use]
    pub const fn age(mut self, age: Option<u8>) -> Self {
        self.age = age;
        self
    }

    #[must_use]
    pub const fn gender(mut self, gender: Option<Gender>) -> Self {
        self.gender = gender;
        self
    }

    #[must_use]
    pub fn doctor_name(mut self, doctor: Option<String>) -> Self {
        self.doctor_name = doctor;
        self
    }

    #[must_use]
    pub const fn fees(mut self, fees: Option<f64>) -> Self {
        self.fees = fees;
        self
    }

    #[must_use]
    pub fn reason_for_visit(mut self, reason: Option<String>) -> Self {
        self.reason_for_visit = reason;
        self
    }

    #[must_use]
    pub const fn appointment_type(mut self, appointment_type: AppointmentType) -> Self {
        self.appointment_type = Some(appointment_type);
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub const fn date_of_birth(mut self, date: Option<NaiveDate>) -> Self {
        self.date_of_birth = date;
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    #[must_use]
    pub fn address(mut self, address: Option<String>) -> Self {
        self.address = address;
        self
    }

    #[must_use]
    pub const fn previous_visit(mut self, previous_visit: bool) -> Self {
        self.previous_visit = previous_visit;
        self
    }

    /// Set insurance provider and policy number
    #[must_use]
    pub fn insurance(mut self, provider: Option<String>, number: Option<String>) -> Self {
        self.insurance_provider = provider;
        self.insurance_number = number;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    #[must_use]
    pub fn medicines(mut self, medicines: Option<String>) -> Self {
        self.medicines = medicines;
        self
    }

    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Record which staff member created the ticket
    #[must_use]
    pub fn created_by(mut self, user_id: Option<UserId>, username: impl Into<String>) -> Self {
        self.created_by = user_id;
        self.created_by_username = Some(username.into());
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the ticket under the given number
    pub fn build(self, ticket_number: TicketNumber) -> Ticket {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ticket {
            id: self.id.unwrap_or_default(),
            ticket_number,
            patient_name: self.patient_name,
            phone_number: self.phone_number,
            age: self.age,
            gender: self.gender,
            doctor_name: self.doctor_name,
            fees: self.fees,
            reason_for_visit: self.reason_for_visit,
            appointment_type: self.appointment_type.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            date_of_birth: self.date_of_birth,
            email: self.email,
            address: self.address,
            previous_visit: self.previous_visit,
            insurance_provider: self.insurance_provider,
            insurance_number: self.insurance_number,
            notes: self.notes,
            medicines: self.medicines,
            status: self.status.unwrap_or_default(),
            created_by: self.created_by,
            created_by_username: self.created_by_username,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_builder() {
        let number: TicketNumber = "T20260120003".parse().unwrap();
        let ticket = TicketBuilder::new()
            .patient_name("Amina Bibi")
            .phone_number("0300 1234567")
            .age(Some(29))
            .gender(Some(Gender::Female))
            .priority(Priority::High)
            .fees(Some(1500.0))
            .build(number.clone());

        assert_eq!(ticket.ticket_number, number);
        assert_eq!(ticket.patient_name, "Amina Bibi");
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.appointment_type, AppointmentType::WalkIn);
        assert_eq!(ticket.status, Status::Pending);
        assert_eq!(ticket.created_at, ticket.updated_at);
    }

    #[test]
    fn test_builder_clones_produce_distinct_ids() {
        let builder = TicketBuilder::new().patient_name("A").phone_number("123456");
        let first = builder.clone().build("T20260120001".parse().unwrap());
        let second = builder.build("T20260120002".parse().unwrap());
        assert_ne!(first.id, second.id);
    }
}
