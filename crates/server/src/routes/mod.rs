//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health              - Health check
//! GET  /api/config          - Frontend toggles (form embed, test mode)
//! GET  /api/booking-status  - Current window/capacity verdict
//! POST /api/book            - Submit a booking
//!
//! /  and /book are static pages served from public/.
//! ```

pub mod booking;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the JSON API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(booking::config))
        .route("/booking-status", get(booking::status))
        .route("/book", post(booking::book))
}

/// Create all routes for the booking site.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
