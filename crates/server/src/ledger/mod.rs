//! Daily booking ledger.
//!
//! One partition per calendar day of the salon, holding the header row
//! plus one append-only row per booking. Row order equals submission
//! order equals queue-number order; the queue number handed to the
//! customer is the count of existing data rows plus one at the moment
//! of append.
//!
//! The count and the append are two separate calls to the backing
//! store, so two racing submissions can read the same count and both
//! append. That weakness is accepted: the store offers no transactional
//! increment, and `append` re-checks the ceiling to narrow (not close)
//! the race window.

use async_trait::async_trait;
use thiserror::Error;

pub mod sheets;

#[cfg(test)]
pub mod memory;

pub use sheets::SheetsLedger;

/// Errors surfaced by a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store could not be reached or refused the request.
    #[error("booking store unavailable: {0}")]
    StoreUnavailable(String),

    /// The day's partition already holds the configured maximum.
    #[error("daily capacity of {0} bookings reached")]
    CapacityExceeded(u32),
}

/// A tabular store of booking rows, partitioned by day key.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Idempotently create the partition for `key` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreUnavailable`] if the store cannot be
    /// reached or the configuration is invalid.
    async fn ensure_partition(&self, key: &str) -> Result<(), LedgerError>;

    /// Idempotently write the header as row 1 if the partition is empty.
    ///
    /// Never overwrites a non-empty partition.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreUnavailable`] on store failure.
    async fn ensure_header(&self, key: &str) -> Result<(), LedgerError>;

    /// Number of data rows (excluding the header) in the partition.
    ///
    /// Degrades to 0 when the partition does not exist or the read
    /// fails: the status endpoint prefers "no bookings yet" over an
    /// error. The write path does not rely on this - [`Ledger::append`]
    /// re-derives the count itself and treats a failed read as a store
    /// failure.
    async fn count_data_rows(&self, key: &str) -> u32;

    /// Append one row and return its 1-based queue number.
    ///
    /// Provisions the partition and header if needed, re-derives the
    /// current count, and enforces the capacity ceiling before writing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CapacityExceeded`] when the freshly
    /// derived count is already at the ceiling (nothing is written),
    /// or [`LedgerError::StoreUnavailable`] on any transport or auth
    /// failure.
    async fn append(&self, key: &str, row: Vec<String>) -> Result<u32, LedgerError>;
}
