//! Input validation for intake forms and account management

use super::{AppointmentType, Gender, NumberInput, Priority, Status, TicketBuilder, TicketIntake};
use crate::error::{ClinicError, Result};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length of any password set through the service
pub const MIN_PASSWORD_LEN: usize = 8;

pub const MAX_AGE: f64 = 150.0;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-\s]{6,20}$").expect("phone pattern is valid"));

/// Trim a string; blank strings become `None`
pub fn clean_string(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Digits, `+`, `-` and spaces, 6 to 20 characters
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// Usernames are stored trimmed and lower-cased
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClinicError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// A status sent by a client; anything but the four known values is rejected
pub fn parse_status(value: Option<&str>) -> Result<Status> {
    clean_string(value)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ClinicError::validation("Valid status is required"))
}

fn parse_age(age: Option<&NumberInput>) -> Result<Option<u8>> {
    let Some(value) = age.and_then(NumberInput::value) else {
        return Ok(None);
    };
    if value.is_nan() || !(0.0..=MAX_AGE).contains(&value) {
        return Err(ClinicError::validation(
            "Age must be a valid number between 0 and 150",
        ));
    }
    // Fractional ages are truncated to whole years
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let years = value as u8;
    Ok(Some(years))
}

fn parse_fees(fees: Option<&NumberInput>) -> Result<Option<f64>> {
    let Some(value) = fees.and_then(NumberInput::value) else {
        return Ok(None);
    };
    if value.is_nan() || value.is_infinite() || value < 0.0 {
        return Err(ClinicError::validation(
            "Fees must be a valid non-negative number",
        ));
    }
    Ok(Some(value))
}

fn parse_date_of_birth(value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = clean_string(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| ClinicError::validation("Date of birth must be a valid date (YYYY-MM-DD)"))
}

fn parse_choice<T: std::str::FromStr<Err = String>>(value: Option<&str>) -> Result<Option<T>> {
    clean_string(value)
        .map(|s| s.parse::<T>().map_err(ClinicError::Validation))
        .transpose()
}

/// Validate an intake form and turn it into a builder awaiting its number
pub fn validate_intake(intake: &TicketIntake) -> Result<TicketBuilder> {
    let patient_name = clean_string(intake.patient_name.as_deref());
    let phone_number = clean_string(intake.phone_number.as_deref());

    let (Some(patient_name), Some(phone_number)) = (patient_name, phone_number) else {
        return Err(ClinicError::validation(
            "Patient name and phone number are required",
        ));
    };

    if !is_valid_phone(&phone_number) {
        return Err(ClinicError::validation("Phone number format is invalid"));
    }

    let age = parse_age(intake.age.as_ref())?;
    let fees = parse_fees(intake.fees.as_ref())?;
    let gender = parse_choice::<Gender>(intake.gender.as_deref())?;
    let appointment_type = parse_choice::<AppointmentType>(intake.appointment_type.as_deref())?;
    let priority = parse_choice::<Priority>(intake.priority.as_deref())?;
    let date_of_birth = parse_date_of_birth(intake.date_of_birth.as_deref())?;

    Ok(TicketBuilder::new()
        .patient_name(patient_name)
        .phone_number(phone_number)
        .age(age)
        .gender(gender)
        .doctor_name(clean_string(intake.doctor_name.as_deref()))
        .fees(fees)
        .reason_for_visit(clean_string(intake.reason_for_visit.as_deref()))
        .appointment_type(appointment_type.unwrap_or_default())
        .priority(priority.unwrap_or_default())
        .date_of_birth(date_of_birth)
        .email(clean_string(intake.email.as_deref()).map(|e| e.to_lowercase()))
        .address(clean_string(intake.address.as_deref()))
        .previous_visit(intake.previous_visit.unwrap_or(false))
        .insurance(
            clean_string(intake.insurance_provider.as_deref()),
            clean_string(intake.insurance_number.as_deref()),
        )
        .notes(clean_string(intake.notes.as_deref()))
        .medicines(clean_string(intake.medicines.as_deref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TicketNumber;

    fn number() -> TicketNumber {
        "T20260120001".parse().unwrap()
    }

    #[test]
    fn test_clean_string() {
        assert_eq!(clean_string(Some("  Amina ")), Some("Amina".to_string()));
        assert_eq!(clean_string(Some("   ")), None);
        assert_eq!(clean_string(None), None);
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("0300 1234567"));
        assert!(is_valid_phone("+92-300-1234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("0300-CALL-ME"));
        assert!(!is_valid_phone(&"1".repeat(21)));
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(Some(" completed ")).unwrap(), Status::Completed);
        let err = parse_status(Some("done")).unwrap_err();
        assert_eq!(err.to_string(), "Valid status is required");
        assert!(parse_status(None).is_err());
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  Reception "), "reception");
    }

    #[test]
    fn test_intake_requires_name_and_phone() {
        let err = validate_intake(&TicketIntake::new("  ", "0300 1234567")).unwrap_err();
        assert_eq!(err.to_string(), "Patient name and phone number are required");

        let err = validate_intake(&TicketIntake::default()).unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn test_intake_rejects_bad_phone() {
        let err = validate_intake(&TicketIntake::new("Amina", "abc")).unwrap_err();
        assert_eq!(err.to_string(), "Phone number format is invalid");
    }

    #[test]
    fn test_intake_age_bounds() {
        let mut intake = TicketIntake::new("Amina", "0300 1234567");
        intake.age = Some(NumberInput::Number(151.0));
        assert!(validate_intake(&intake).is_err());

        intake.age = Some(NumberInput::Text("not a number".to_string()));
        assert!(validate_intake(&intake).is_err());

        intake.age = Some(NumberInput::Text(String::new()));
        let ticket = validate_intake(&intake).unwrap().build(number());
        assert_eq!(ticket.age, None);

        intake.age = Some(NumberInput::Number(0.0));
        let ticket = validate_intake(&intake).unwrap().build(number());
        assert_eq!(ticket.age, Some(0));
    }

    #[test]
    fn test_intake_fees_non_negative() {
        let mut intake = TicketIntake::new("Amina", "0300 1234567");
        intake.fees = Some(NumberInput::Number(-1.0));
        let err = validate_intake(&intake).unwrap_err();
        assert_eq!(err.to_string(), "Fees must be a valid non-negative number");

        intake.fees = Some(NumberInput::Text("2500".to_string()));
        let ticket = validate_intake(&intake).unwrap().build(number());
        assert_eq!(ticket.fees, Some(2500.0));
    }

    #[test]
    fn test_intake_defaults_and_normalisation() {
        let mut intake = TicketIntake::new(" Amina Bibi ", " 0300 1234567 ");
        intake.email = Some(" Amina@Example.COM ".to_string());
        intake.doctor_name = Some("   ".to_string());
        intake.date_of_birth = Some("1996-04-02".to_string());

        let ticket = validate_intake(&intake).unwrap().build(number());
        assert_eq!(ticket.patient_name, "Amina Bibi");
        assert_eq!(ticket.phone_number, "0300 1234567");
        assert_eq!(ticket.email.as_deref(), Some("amina@example.com"));
        assert_eq!(ticket.doctor_name, None);
        assert_eq!(ticket.appointment_type, AppointmentType::WalkIn);
        assert_eq!(ticket.priority, Priority::Normal);
        assert_eq!(ticket.status, Status::Pending);
        assert!(!ticket.previous_visit);
        assert_eq!(ticket.date_of_birth, NaiveDate::from_ymd_opt(1996, 4, 2));
    }

    #[test]
    fn test_intake_rejects_unknown_choices() {
        let mut intake = TicketIntake::new("Amina", "0300 1234567");
        intake.priority = Some("critical".to_string());
        assert!(validate_intake(&intake).is_err());

        let mut intake = TicketIntake::new("Amina", "0300 1234567");
        intake.gender = Some("unknown".to_string());
        assert!(validate_intake(&intake).is_err());

        let mut intake = TicketIntake::new("Amina", "0300 1234567");
        intake.date_of_birth = Some("02/04/1996".to_string());
        assert!(validate_intake(&intake).is_err());
    }
}
