//! Booking admission control.
//!
//! Composes the window policy and the ledger's row count against the
//! capacity ceiling: validate the request, check the window, pre-check
//! capacity, then append. The ledger re-checks the ceiling at append
//! time, so a degraded (zero) pre-check read cannot oversell a day.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use salon_booking_core::{BookingRequest, InvalidBooking, window};

use crate::ledger::LedgerError;
use crate::state::AppState;

/// Outcome of a booking submission.
///
/// Store unavailability is not a variant; it propagates as the `Err`
/// arm of [`submit`] so the handler can log and answer with a server
/// error.
#[derive(Debug)]
pub enum Decision {
    /// Booked, with the customer's 1-based queue number for the day.
    Accepted {
        queue_number: u32,
        booked_at: DateTime<Utc>,
    },
    /// Required fields missing or blank.
    InvalidInput(InvalidBooking),
    /// The booking window is closed until `next_opening`.
    WindowClosed { next_opening: DateTime<Tz> },
    /// Today's partition is full; bookings reopen at `next_opening`.
    CapacityFull { next_opening: DateTime<Tz> },
}

/// Current booking availability, as reported by the status endpoint.
#[derive(Debug)]
pub struct Status {
    /// Accepting bookings right now (window open and slots left).
    pub open: bool,
    /// Capacity is the reason bookings are unavailable, distinguishable
    /// from a closed window.
    pub slots_full: bool,
    /// Customer-facing explanation.
    pub message: String,
    /// When the window next opens.
    pub next_opening: DateTime<Tz>,
}

/// Submit a booking request.
///
/// # Errors
///
/// Returns [`LedgerError::StoreUnavailable`] when the backing store
/// cannot be reached; every business rejection is a [`Decision`].
pub async fn submit(state: &AppState, request: BookingRequest) -> Result<Decision, LedgerError> {
    submit_at(state, request, Utc::now()).await
}

async fn submit_at(
    state: &AppState,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> Result<Decision, LedgerError> {
    let policy = &state.config().booking;

    if let Err(invalid) = request.validate(policy.require_time) {
        return Ok(Decision::InvalidInput(invalid));
    }

    if !window::is_open(now, policy.timezone, policy.always_open) {
        return Ok(Decision::WindowClosed {
            next_opening: window::next_opening(now, policy.timezone),
        });
    }

    let key = state.partition_key(now);
    if state.ledger().count_data_rows(&key).await >= policy.capacity {
        return Ok(Decision::CapacityFull {
            next_opening: window::next_opening(now, policy.timezone),
        });
    }

    // Bookings are for today only - no advance bookings. The date
    // column is the salon's calendar day even when tabs are off.
    let date = window::day_key(now, policy.timezone);
    let row = request.to_row(&date, now);

    match state.ledger().append(&key, row).await {
        Ok(queue_number) => {
            tracing::info!(queue_number, key = %key, "Booking accepted");
            send_confirmation(state, &request, queue_number);
            Ok(Decision::Accepted {
                queue_number,
                booked_at: now,
            })
        }
        Err(LedgerError::CapacityExceeded(_)) => Ok(Decision::CapacityFull {
            next_opening: window::next_opening(now, policy.timezone),
        }),
        Err(err) => Err(err),
    }
}

/// Current verdict without mutating anything.
pub async fn status(state: &AppState) -> Status {
    status_at(state, Utc::now()).await
}

async fn status_at(state: &AppState, now: DateTime<Utc>) -> Status {
    let policy = &state.config().booking;

    let window_open = window::is_open(now, policy.timezone, policy.always_open);
    let key = state.partition_key(now);
    let slots_full = state.ledger().count_data_rows(&key).await >= policy.capacity;

    let message = if !window_open {
        "Bookings open daily at 12:00 AM (midnight).".to_string()
    } else if slots_full {
        format!(
            "All {} slots for today are taken. Bookings reopen at midnight.",
            policy.capacity
        )
    } else {
        "Bookings are open.".to_string()
    };

    Status {
        open: window_open && !slots_full,
        slots_full,
        message,
        next_opening: window::next_opening(now, policy.timezone),
    }
}

/// Dispatch the confirmation email without blocking the response.
///
/// Fire-and-forget: any failure is logged for operators and never
/// reaches the customer.
fn send_confirmation(state: &AppState, request: &BookingRequest, queue_number: u32) {
    let Some(mailer) = state.mailer().cloned() else {
        return;
    };
    let Some(email) = request.email() else {
        return;
    };

    let email = email.to_string();
    let name = request.customer_name.trim().to_string();
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send_booking_confirmation(&email, &name, queue_number)
            .await
        {
            tracing::warn!(error = %e, "Failed to send booking confirmation");
        }
    });
}
