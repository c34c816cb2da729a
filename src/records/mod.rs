//! Leave record subsystem.
//!
//! # Data Flow
//! ```text
//! seed file (JSON) ─┐
//!                   ├─→ NewLeaveRecord → days.rs (derive inclusive day count)
//! append request ───┘                  → store.rs (insertion-ordered, RwLock)
//!
//! query request → store.rs find (claim code + national id, exact match)
//! ```
//!
//! # Design Decisions
//! - The day count is always derived, never accepted from a caller
//! - Dates are kept exactly as supplied; only the derived field degrades
//! - Claim codes are not globally unique, the pair is the lookup key

pub mod days;
pub mod seed;
pub mod store;

use serde::{Deserialize, Serialize};

pub use days::days;
pub use store::{MemoryRecordStore, RecordStore};

/// A stored leave record, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    pub claim_code: String,
    pub national_id: String,
    pub holder_name: String,
    pub report_date: String,
    pub start_date: String,
    pub end_date: String,
    pub issuing_physician: String,
    pub job_title: String,
    /// Derived from `start_date` and `end_date` when the record is created.
    pub inclusive_day_count: i64,
}

/// A record as supplied by a caller or the seed file, before derivation.
///
/// Unknown fields (including any caller-supplied day count) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaveRecord {
    pub claim_code: String,
    pub national_id: String,
    pub holder_name: String,
    pub report_date: String,
    pub start_date: String,
    pub end_date: String,
    pub issuing_physician: String,
    pub job_title: String,
}

impl NewLeaveRecord {
    /// Finalize the record, computing the inclusive day count.
    pub fn into_record(self) -> LeaveRecord {
        let inclusive_day_count = days(&self.start_date, &self.end_date);
        LeaveRecord {
            claim_code: self.claim_code,
            national_id: self.national_id,
            holder_name: self.holder_name,
            report_date: self.report_date,
            start_date: self.start_date,
            end_date: self.end_date,
            issuing_physician: self.issuing_physician,
            job_title: self.job_title,
            inclusive_day_count,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(claim_code: &str, national_id: &str, start: &str, end: &str) -> NewLeaveRecord {
    NewLeaveRecord {
        claim_code: claim_code.to_string(),
        national_id: national_id.to_string(),
        holder_name: "Test Holder".to_string(),
        report_date: start.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        issuing_physician: "Dr. Example".to_string(),
        job_title: "Consultant".to_string(),
    }
}
