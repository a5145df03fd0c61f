//! In-memory ledger with the same semantics as the Sheets one.
//!
//! Test double for the admission controller: partitions are vectors of
//! rows (header first), and an outage switch makes every store call
//! fail the way an unreachable spreadsheet would.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use salon_booking_core::header_row;

use super::{Ledger, LedgerError};

pub struct MemoryLedger {
    partitions: Mutex<HashMap<String, Vec<Vec<String>>>>,
    capacity: u32,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn new(capacity: u32) -> Self {
        Self {
            partitions: Mutex::new(HashMap::new()),
            capacity,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate the backing store going away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All rows of a partition (header included), for assertions.
    pub fn rows(&self, key: &str) -> Option<Vec<Vec<String>>> {
        self.partitions
            .lock()
            .expect("ledger lock")
            .get(key)
            .cloned()
    }

    /// Number of partitions that exist.
    pub fn partition_count(&self) -> usize {
        self.partitions.lock().expect("ledger lock").len()
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LedgerError::StoreUnavailable(
                "simulated outage".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn ensure_partition(&self, key: &str) -> Result<(), LedgerError> {
        self.check_available()?;
        self.partitions
            .lock()
            .expect("ledger lock")
            .entry(key.to_string())
            .or_default();
        Ok(())
    }

    async fn ensure_header(&self, key: &str) -> Result<(), LedgerError> {
        self.check_available()?;
        let mut partitions = self.partitions.lock().expect("ledger lock");
        let rows = partitions.entry(key.to_string()).or_default();
        if rows.is_empty() {
            rows.push(header_row());
        }
        Ok(())
    }

    async fn count_data_rows(&self, key: &str) -> u32 {
        if self.unavailable.load(Ordering::SeqCst) {
            // Same degradation as the real store: reads fail soft.
            return 0;
        }
        self.partitions
            .lock()
            .expect("ledger lock")
            .get(key)
            .map_or(0, |rows| {
                u32::try_from(rows.len().saturating_sub(1)).unwrap_or(u32::MAX)
            })
    }

    async fn append(&self, key: &str, row: Vec<String>) -> Result<u32, LedgerError> {
        self.check_available()?;
        let mut partitions = self.partitions.lock().expect("ledger lock");
        let rows = partitions.entry(key.to_string()).or_default();
        if rows.is_empty() {
            rows.push(header_row());
        }

        let count = u32::try_from(rows.len().saturating_sub(1)).unwrap_or(u32::MAX);
        if count >= self.capacity {
            return Err(LedgerError::CapacityExceeded(self.capacity));
        }

        rows.push(row);
        Ok(count + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[tokio::test]
    async fn test_count_is_zero_after_ensure_header() {
        let ledger = MemoryLedger::new(20);
        ledger.ensure_partition("2025-06-01").await.expect("ensure");
        ledger.ensure_header("2025-06-01").await.expect("header");
        assert_eq!(ledger.count_data_rows("2025-06-01").await, 0);
    }

    #[tokio::test]
    async fn test_count_is_zero_for_missing_partition() {
        let ledger = MemoryLedger::new(20);
        assert_eq!(ledger.count_data_rows("2025-06-01").await, 0);
    }

    #[tokio::test]
    async fn test_sequential_appends_yield_consecutive_queue_numbers() {
        let ledger = MemoryLedger::new(20);
        for expected in 1..=5 {
            let n = ledger
                .append("2025-06-01", row("customer"))
                .await
                .expect("append");
            assert_eq!(n, expected);
        }
    }

    #[tokio::test]
    async fn test_append_at_ceiling_fails_without_mutation() {
        let ledger = MemoryLedger::new(2);
        ledger.append("2025-06-01", row("a")).await.expect("append");
        ledger.append("2025-06-01", row("b")).await.expect("append");

        let err = ledger
            .append("2025-06-01", row("c"))
            .await
            .expect_err("capacity reached");
        assert!(matches!(err, LedgerError::CapacityExceeded(2)));

        // Header + two data rows, untouched by the failed append.
        let rows = ledger.rows("2025-06-01").expect("partition exists");
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_header_does_not_overwrite_existing_rows() {
        let ledger = MemoryLedger::new(20);
        ledger.append("2025-06-01", row("a")).await.expect("append");
        ledger.ensure_header("2025-06-01").await.expect("header");

        let rows = ledger.rows("2025-06-01").expect("partition exists");
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_outage_degrades_count_and_fails_append() {
        let ledger = MemoryLedger::new(20);
        ledger.append("2025-06-01", row("a")).await.expect("append");
        ledger.set_unavailable(true);

        assert_eq!(ledger.count_data_rows("2025-06-01").await, 0);
        let err = ledger
            .append("2025-06-01", row("b"))
            .await
            .expect_err("store down");
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    }
}
