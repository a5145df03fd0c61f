//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use salon_booking_core::window;

use crate::config::AppConfig;
use crate::ledger::{Ledger, SheetsLedger, sheets::SheetsError};
use crate::services::EmailService;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sheets client error: {0}")]
    Sheets(#[from] SheetsError),
    #[error("email transport error: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the read-only configuration, the
/// booking ledger, and the optional mailer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    ledger: Arc<dyn Ledger>,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Sheets client or the SMTP transport
    /// cannot be constructed.
    pub fn new(config: AppConfig) -> Result<Self, StateError> {
        let ledger: Arc<dyn Ledger> =
            Arc::new(SheetsLedger::new(&config.sheets, config.booking.capacity)?);
        let mailer = config.email.as_ref().map(EmailService::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                ledger,
                mailer,
            }),
        })
    }

    /// State backed by an arbitrary ledger, for tests.
    #[cfg(test)]
    pub(crate) fn with_ledger(config: AppConfig, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                ledger,
                mailer: None,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the booking ledger.
    #[must_use]
    pub fn ledger(&self) -> &dyn Ledger {
        self.inner.ledger.as_ref()
    }

    /// Get a reference to the email service, if configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }

    /// Partition key bookings are written to at `now`.
    ///
    /// The day key in the business timezone when daily tabs are on,
    /// else the single configured tab name.
    #[must_use]
    pub fn partition_key(&self, now: DateTime<Utc>) -> String {
        if self.inner.config.sheets.use_daily_tabs {
            window::day_key(now, self.inner.config.booking.timezone)
        } else {
            self.inner.config.sheets.sheet_name.clone()
        }
    }
}
