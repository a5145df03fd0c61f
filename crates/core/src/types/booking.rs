//! Booking request type and the sheet row schema.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

/// Column headers of a day partition, always written as row 1.
///
/// The column order is part of the external contract with the
/// spreadsheet; `BookingRequest::to_row` must stay in sync with it.
pub const SHEET_HEADERS: [&str; 9] = [
    "Date",
    "Time",
    "Customer Name",
    "Phone",
    "Email",
    "Service",
    "How did you hear",
    "Notes",
    "Booked At",
];

/// The header row as owned strings, ready to write to the store.
#[must_use]
pub fn header_row() -> Vec<String> {
    SHEET_HEADERS.iter().map(ToString::to_string).collect()
}

/// Errors for a booking request that fails validation.
///
/// Carries the names of the missing fields so the caller can tell the
/// customer exactly what to fill in.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing required fields: {}", fields.join(", "))]
pub struct InvalidBooking {
    /// Required fields that were absent or blank.
    pub fields: Vec<&'static str>,
}

/// An incoming appointment request from the booking form.
///
/// Every field defaults to empty so that deserialization never fails on
/// a missing key; [`BookingRequest::validate`] is what decides whether
/// the submission is acceptable. This keeps the rejection a structured
/// business outcome instead of a framework-level decode error.
///
/// A booking is never stored as an object with identity - it is written
/// through as one flat row via [`BookingRequest::to_row`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub service: String,
    /// Preferred time of day, free text. Required only when the
    /// deployment says so (`require_time`).
    pub time: String,
    /// "How did you hear about us", free text.
    pub source: String,
    pub notes: String,
}

impl BookingRequest {
    /// Check that all required fields are present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBooking`] naming every missing field. Whitespace
    /// counts as missing.
    pub fn validate(&self, require_time: bool) -> Result<(), InvalidBooking> {
        let mut missing = Vec::new();
        if self.customer_name.trim().is_empty() {
            missing.push("customerName");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.service.trim().is_empty() {
            missing.push("service");
        }
        if require_time && self.time.trim().is_empty() {
            missing.push("time");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InvalidBooking { fields: missing })
        }
    }

    /// Flatten the request into a sheet row for the given day partition.
    ///
    /// Free-text fields are trimmed on the way out; `booked_at` is
    /// written as an ISO-8601 UTC timestamp in the last column.
    #[must_use]
    pub fn to_row(&self, date: &str, booked_at: DateTime<Utc>) -> Vec<String> {
        vec![
            date.to_string(),
            self.time.trim().to_string(),
            self.customer_name.trim().to_string(),
            self.phone.trim().to_string(),
            self.email.trim().to_string(),
            self.service.trim().to_string(),
            self.source.trim().to_string(),
            self.notes.trim().to_string(),
            booked_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }

    /// Email address of the customer, if one was provided.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn valid_request() -> BookingRequest {
        BookingRequest {
            customer_name: "Aisha Rahman".to_string(),
            phone: "+60123456789".to_string(),
            email: "aisha@example.com".to_string(),
            service: "Haircut".to_string(),
            time: "10:30".to_string(),
            source: "Instagram".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let req: BookingRequest = serde_json::from_str(
            r#"{"customerName":"Mei Lin","phone":"012","service":"Hair spa"}"#,
        )
        .unwrap();
        assert_eq!(req.customer_name, "Mei Lin");
        assert_eq!(req.service, "Hair spa");
        assert!(req.email.is_empty());
        assert!(req.notes.is_empty());
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert!(valid_request().validate(true).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_service() {
        let mut req = valid_request();
        req.service = String::new();
        let err = req.validate(true).unwrap_err();
        assert_eq!(err.fields, vec!["service"]);
    }

    #[test]
    fn test_validate_treats_whitespace_as_missing() {
        let mut req = valid_request();
        req.customer_name = "   ".to_string();
        req.phone = "\t".to_string();
        let err = req.validate(false).unwrap_err();
        assert_eq!(err.fields, vec!["customerName", "phone"]);
    }

    #[test]
    fn test_validate_time_only_when_required() {
        let mut req = valid_request();
        req.time = String::new();
        assert!(req.validate(false).is_ok());
        let err = req.validate(true).unwrap_err();
        assert_eq!(err.fields, vec!["time"]);
    }

    #[test]
    fn test_to_row_matches_header_order() {
        let mut req = valid_request();
        req.notes = "  window seat  ".to_string();
        let booked_at = chrono::Utc.with_ymd_and_hms(2025, 6, 1, 9, 15, 0).unwrap();
        let row = req.to_row("2025-06-01", booked_at);

        assert_eq!(row.len(), SHEET_HEADERS.len());
        assert_eq!(row[0], "2025-06-01");
        assert_eq!(row[1], "10:30");
        assert_eq!(row[2], "Aisha Rahman");
        assert_eq!(row[5], "Haircut");
        assert_eq!(row[7], "window seat");
        assert_eq!(row[8], "2025-06-01T09:15:00.000Z");
    }

    #[test]
    fn test_email_accessor() {
        assert_eq!(valid_request().email(), Some("aisha@example.com"));
        let mut req = valid_request();
        req.email = "  ".to_string();
        assert_eq!(req.email(), None);
    }
}
