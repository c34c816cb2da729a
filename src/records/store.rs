//! In-memory record repository.

use std::sync::{PoisonError, RwLock};

use crate::observability::metrics;
use crate::records::{LeaveRecord, NewLeaveRecord};

/// Repository of leave records keyed by (claim code, national id).
///
/// Implementations must make `append` atomic with respect to `find` and
/// `list` when shared across threads.
pub trait RecordStore: Send + Sync {
    /// First record matching both fields exactly, in insertion order.
    fn find(&self, claim_code: &str, national_id: &str) -> Option<LeaveRecord>;

    /// Derive the day count, store the record and return the stored copy.
    fn append(&self, record: NewLeaveRecord) -> LeaveRecord;

    /// Owned snapshot of every record in insertion order.
    fn list(&self) -> Vec<LeaveRecord>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Volatile store backed by an insertion-ordered vector.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<LeaveRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with seed records.
    pub fn seeded(seed: impl IntoIterator<Item = NewLeaveRecord>) -> Self {
        let records: Vec<LeaveRecord> = seed.into_iter().map(NewLeaveRecord::into_record).collect();
        metrics::record_store_size(records.len());
        Self {
            records: RwLock::new(records),
        }
    }
}

// A panic while holding the lock cannot leave the vector half-written
// (push is the only mutation), so poisoned guards are recovered.
impl RecordStore for MemoryRecordStore {
    fn find(&self, claim_code: &str, national_id: &str) -> Option<LeaveRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|r| r.claim_code == claim_code && r.national_id == national_id)
            .cloned()
    }

    fn append(&self, record: NewLeaveRecord) -> LeaveRecord {
        let record = record.into_record();
        let len = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            records.push(record.clone());
            records.len()
        };
        metrics::record_store_size(len);
        tracing::debug!(
            claim_code = %record.claim_code,
            days = record.inclusive_day_count,
            "Leave record appended"
        );
        record
    }

    fn list(&self) -> Vec<LeaveRecord> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{days, sample};
    use std::sync::Arc;

    #[test]
    fn test_find_exact_pair() {
        let store = MemoryRecordStore::seeded(vec![
            sample("AAAA1111", "1111111111", "2025-01-01", "2025-01-02"),
            sample("AAAA1111", "2222222222", "2025-01-01", "2025-01-05"),
        ]);

        let hit = store.find("AAAA1111", "2222222222").unwrap();
        assert_eq!(hit.inclusive_day_count, 5);
        assert!(store.find("AAAA1111", "3333333333").is_none());
        assert!(store.find("aaaa1111", "1111111111").is_none());
    }

    #[test]
    fn test_find_returns_first_duplicate() {
        let store = MemoryRecordStore::new();
        store.append(sample("DUPL1234", "1234567890", "2025-01-01", "2025-01-01"));
        store.append(sample("DUPL1234", "1234567890", "2025-01-01", "2025-01-10"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.find("DUPL1234", "1234567890").unwrap().inclusive_day_count, 1);
    }

    #[test]
    fn test_append_returns_derived_record() {
        let store = MemoryRecordStore::new();
        let stored = store.append(sample("NEWR1234", "1234567890", "2025-07-12", "2025-07-17"));
        assert_eq!(stored.inclusive_day_count, days("2025-07-12", "2025-07-17"));
        assert_eq!(store.list(), vec![stored]);
    }

    #[test]
    fn test_bad_dates_are_stored_with_zero_days() {
        let store = MemoryRecordStore::new();
        let stored = store.append(sample("BADD1234", "1234567890", "soon", "later"));
        assert_eq!(stored.inclusive_day_count, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = MemoryRecordStore::seeded(vec![sample("SNAP1234", "1234567890", "2025-01-01", "2025-01-02")]);
        let mut snapshot = store.list();
        snapshot.clear();
        assert_eq!(store.len(), 1);
        assert_eq!(store.list(), store.list());
    }

    #[test]
    fn test_concurrent_appends_are_all_kept() {
        let store = Arc::new(MemoryRecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store.append(sample(&format!("THRD{i:02}{j:02}"), "1234567890", "2025-01-01", "2025-01-01"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 200);
    }
}
