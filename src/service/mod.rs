//! Leave use cases: query, append and list.
//!
//! # Data Flow
//! ```text
//! query:  validate_query → captcha (when configured) → store.find
//! append: authenticate → validate_append → store.append
//! list:   authenticate → store.list
//! ```
//!
//! The request gate runs before any of these, in the HTTP layer, so
//! rejected requests never reach payload parsing.
//!
//! # Design Decisions
//! - The store is injected, never global
//! - Store mutation never straddles an await point
//! - Not-found and validation failures stay distinct internally

pub mod context;

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::captcha::CaptchaVerifier;
use crate::error::{DenialReason, LeaveError, LeaveResult};
use crate::records::{LeaveRecord, RecordStore};
use crate::validation::{validate_append, validate_query, DatePolicy};

pub use context::RequestContext;

/// Orchestrates validation, verification, authentication and storage.
pub struct LeaveService {
    store: Arc<dyn RecordStore>,
    captcha: CaptchaVerifier,
    auth: Authenticator,
    dates: DatePolicy,
}

impl LeaveService {
    pub fn new(store: Arc<dyn RecordStore>, captcha: CaptchaVerifier, auth: Authenticator, dates: DatePolicy) -> Self {
        Self {
            store,
            captcha,
            auth,
            dates,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Look up a record by claim code and national id.
    pub async fn query_leave(&self, ctx: &RequestContext) -> LeaveResult<LeaveRecord> {
        let query = validate_query(&ctx.payload)?;

        // Opt-in: a verifier without a secret answers true without a network call.
        match self.captcha.verify(query.captcha_token.as_deref(), ctx.client_addr).await {
            Ok(true) => {}
            Ok(false) => return Err(LeaveError::AccessDenied(DenialReason::Captcha)),
            Err(e) => return Err(e.into()),
        }

        self.store
            .find(&query.claim_code, &query.national_id)
            .ok_or(LeaveError::NotFound)
    }

    /// Append a record for an authenticated caller.
    pub fn append_leave(&self, ctx: &RequestContext) -> LeaveResult<LeaveRecord> {
        let identity = self.auth.authenticate(ctx.authorization.as_deref()).inspect_err(|e| {
            tracing::info!(request_id = %ctx.request_id, error = %e, "Append rejected: authentication failed");
        })?;
        let record = validate_append(&ctx.payload, self.dates)?;

        let stored = self.store.append(record);
        tracing::info!(
            request_id = %ctx.request_id,
            subject = %identity.subject,
            claim_code = %stored.claim_code,
            days = stored.inclusive_day_count,
            "Leave record added"
        );
        Ok(stored)
    }

    /// Snapshot of every record for an authenticated caller.
    pub fn list_leaves(&self, ctx: &RequestContext) -> LeaveResult<Vec<LeaveRecord>> {
        self.auth.authenticate(ctx.authorization.as_deref()).inspect_err(|e| {
            tracing::info!(request_id = %ctx.request_id, error = %e, "List rejected: authentication failed");
        })?;
        Ok(self.store.list())
    }
}
