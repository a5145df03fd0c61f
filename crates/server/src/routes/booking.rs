//! Booking route handlers.
//!
//! Maps admission decisions to JSON responses: client error for invalid
//! input, forbidden for a closed window or a full day, server error for
//! store failure. Response bodies carry camelCase fields for the form
//! script.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::instrument;

use salon_booking_core::BookingRequest;

use crate::booking::{self, Decision};
use crate::state::AppState;

/// Response for `/api/config`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub use_google_form: bool,
    pub google_form_embed_url: Option<String>,
    pub booking_always_open: bool,
}

/// Response for `/api/booking-status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub open: bool,
    pub slots_full: bool,
    pub message: String,
    pub next_opening: String,
}

/// Response for `/api/book`, both arms.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_opening: Option<String>,
}

impl BookResponse {
    fn accepted(queue_number: u32, booked_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            message: Some(format!(
                "Your appointment has been booked. Your queue number is {queue_number}."
            )),
            queue_number: Some(queue_number),
            booked_at: Some(booked_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            error: None,
            slots_full: None,
            next_opening: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            queue_number: None,
            booked_at: None,
            error: Some(error.into()),
            slots_full: None,
            next_opening: None,
        }
    }
}

/// Frontend configuration toggles.
///
/// GET /api/config
pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = state.config();
    Json(ConfigResponse {
        use_google_form: config.google_form_embed_url.is_some(),
        google_form_embed_url: config.google_form_embed_url.clone(),
        booking_always_open: config.booking.always_open,
    })
}

/// Current booking availability.
///
/// GET /api/booking-status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = booking::status(&state).await;
    Json(StatusResponse {
        open: status.open,
        slots_full: status.slots_full,
        message: status.message,
        next_opening: iso8601(&status.next_opening),
    })
}

/// Submit a booking.
///
/// POST /api/book
#[instrument(skip(state, request), fields(service = %request.service))]
pub async fn book(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> impl IntoResponse {
    // With an embedded Google Form the sheet is fed by the form itself.
    if state.config().google_form_embed_url.is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(BookResponse::rejected(
                "Bookings use the Google Form; please submit there.",
            )),
        );
    }

    match booking::submit(&state, request).await {
        Ok(Decision::Accepted {
            queue_number,
            booked_at,
        }) => (
            StatusCode::OK,
            Json(BookResponse::accepted(queue_number, booked_at)),
        ),
        Ok(Decision::InvalidInput(invalid)) => (
            StatusCode::BAD_REQUEST,
            Json(BookResponse::rejected(format!(
                "Please provide: {}.",
                invalid.fields.join(", ")
            ))),
        ),
        Ok(Decision::WindowClosed { next_opening }) => {
            let mut response = BookResponse::rejected(
                "Bookings open daily at 12:00 AM (midnight). Please try again then.",
            );
            response.next_opening = Some(iso8601(&next_opening));
            (StatusCode::FORBIDDEN, Json(response))
        }
        Ok(Decision::CapacityFull { next_opening }) => {
            let mut response = BookResponse::rejected(
                "All booking slots for today are taken. Bookings reopen at midnight.",
            );
            response.slots_full = Some(true);
            response.next_opening = Some(iso8601(&next_opening));
            (StatusCode::FORBIDDEN, Json(response))
        }
        Err(err) => {
            let event_id = sentry::capture_error(&err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "Booking failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BookResponse::rejected(
                    "Failed to save booking. Please try again later.",
                )),
            )
        }
    }
}

/// ISO-8601 timestamp in the business timezone's offset.
fn iso8601(instant: &DateTime<Tz>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_accepted_response_shape() {
        let booked_at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 15, 0).unwrap();
        let response = BookResponse::accepted(3, booked_at);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["queueNumber"], 3);
        assert_eq!(json["bookedAt"], "2025-06-01T09:15:00.000Z");
        assert!(json.get("error").is_none());
        assert!(json.get("slotsFull").is_none());
    }

    #[test]
    fn test_rejected_response_omits_acceptance_fields() {
        let response = BookResponse::rejected("nope");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
        assert!(json.get("queueNumber").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_iso8601_keeps_business_offset() {
        let instant = chrono_tz::Asia::Kuala_Lumpur
            .with_ymd_and_hms(2025, 6, 2, 0, 0, 0)
            .unwrap();
        assert_eq!(iso8601(&instant), "2025-06-02T00:00:00+08:00");
    }
}
