//! Domain types for the booking system.

mod booking;

pub use booking::{BookingRequest, InvalidBooking, SHEET_HEADERS, header_row};
