//! The 12-character daily ticket number
//!
//! Layout: `T` + UTC date as `YYYYMMDD` + 3-digit zero-padded sequence,
//! e.g. `T20260120001`. Both segments are fixed width, so lexicographic
//! order on the string equals chronological-then-sequence order.

use crate::error::{ClinicError, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static TICKET_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^T(\d{8})(\d{3})$").expect("ticket number pattern is valid"));

/// A validated ticket number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketNumber(String);

impl TicketNumber {
    pub const PREFIX: char = 'T';
    pub const LEN: usize = 12;
    pub const MAX_SEQUENCE: u32 = 999;

    /// Build the number for `sequence` on `date`
    ///
    /// Sequences above [`Self::MAX_SEQUENCE`] do not fit the 3-digit field
    /// and yield [`ClinicError::SequenceExhausted`] instead of a wider string.
    pub fn new(date: NaiveDate, sequence: u32) -> Result<Self> {
        if sequence == 0 {
            return Err(ClinicError::InvalidTicketNumber(format!(
                "sequence 0 on {date}"
            )));
        }
        if sequence > Self::MAX_SEQUENCE {
            return Err(ClinicError::SequenceExhausted { date });
        }
        Ok(Self(format!("{}{sequence:03}", Self::date_prefix(date))))
    }

    /// `T` followed by the date, the prefix shared by every ticket of that day
    pub fn date_prefix(date: NaiveDate) -> String {
        format!("{}{}", Self::PREFIX, date.format("%Y%m%d"))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let caps = TICKET_NUMBER_RE
            .captures(s)
            .ok_or_else(|| ClinicError::InvalidTicketNumber(s.to_string()))?;
        NaiveDate::parse_from_str(&caps[1], "%Y%m%d")
            .map_err(|_| ClinicError::InvalidTicketNumber(s.to_string()))?;
        if &caps[2] == "000" {
            return Err(ClinicError::InvalidTicketNumber(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> NaiveDate {
        // Validated on construction
        NaiveDate::parse_from_str(&self.0[1..9], "%Y%m%d").unwrap_or_default()
    }

    pub fn sequence(&self) -> u32 {
        self.0[9..].parse().unwrap_or_default()
    }

    /// Trailing three digits, the part shown to patients
    pub fn display_suffix(&self) -> &str {
        &self.0[9..]
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TicketNumber {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TicketNumber {
    type Error = ClinicError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TicketNumber> for String {
    fn from(number: TicketNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for TicketNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_pads_sequence() {
        let number = TicketNumber::new(date(2026, 1, 20), 1).unwrap();
        assert_eq!(number.as_str(), "T20260120001");
        assert_eq!(number.as_str().len(), TicketNumber::LEN);

        let number = TicketNumber::new(date(2026, 1, 20), 42).unwrap();
        assert_eq!(number.as_str(), "T20260120042");
        assert_eq!(number.display_suffix(), "042");
        assert_eq!(number.sequence(), 42);
        assert_eq!(number.date(), date(2026, 1, 20));
    }

    #[test]
    fn test_new_rejects_overflow() {
        assert!(TicketNumber::new(date(2026, 1, 20), 999).is_ok());
        let err = TicketNumber::new(date(2026, 1, 20), 1000).unwrap_err();
        assert!(matches!(
            err,
            ClinicError::SequenceExhausted { date: d } if d == date(2026, 1, 20)
        ));
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(TicketNumber::new(date(2026, 1, 20), 0).is_err());
    }

    #[test]
    fn test_parse_validates_shape() {
        assert!(TicketNumber::parse("T20260120001").is_ok());
        assert!(TicketNumber::parse("T2026012001").is_err());
        assert!(TicketNumber::parse("X20260120001").is_err());
        assert!(TicketNumber::parse("T20261320001").is_err());
        assert!(TicketNumber::parse("T20260120000").is_err());
        assert!(TicketNumber::parse("T202601201000").is_err());
        assert!(TicketNumber::parse("t20260120001").is_err());
    }

    #[test]
    fn test_ordering_matches_sequence() {
        let a = TicketNumber::parse("T20260120009").unwrap();
        let b = TicketNumber::parse("T20260120010").unwrap();
        let c = TicketNumber::parse("T20260121001").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let ok: TicketNumber = serde_json::from_str("\"T20260120007\"").unwrap();
        assert_eq!(ok.sequence(), 7);
        assert!(serde_json::from_str::<TicketNumber>("\"T2026\"").is_err());
    }
}
