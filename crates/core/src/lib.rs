//! Salon Booking Core - Shared domain library.
//!
//! This crate provides the pure pieces of the booking system:
//! - [`types`] - The booking request, its validation, and the sheet row schema
//! - [`window`] - Booking-window policy and day-partition keys in the
//!   business timezone
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Callers inject `now`, which keeps every policy
//! decision unit-testable.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod window;

pub use types::*;
