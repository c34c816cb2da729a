//! Payload validation at the HTTP boundary.
//!
//! # Data Flow
//! ```text
//! raw body bytes
//!     → parse_body (JSON object required)
//!     → rules.rs field table, applied in order (first failure wins)
//!     → ValidatedQuery / NewLeaveRecord (typed, passed downward)
//! ```
//!
//! # Design Decisions
//! - Pure: never touches the store or the network
//! - No partial results: any failing field rejects the whole payload
//! - Unparseable dates are tolerated unless strict date checking is enabled

pub mod rules;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::records::NewLeaveRecord;
use self::rules::{FieldRule, APPEND_FIELDS, QUERY_FIELDS};

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),

    #[error("field `{0}` must not be empty")]
    Empty(&'static str),

    #[error("field `{0}` has an invalid format")]
    Format(&'static str),

    #[error("field `{0}` is not a valid date")]
    Date(&'static str),
}

/// How date fields are checked on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePolicy {
    /// Accept any non-empty string; bad dates yield a zero day count.
    #[default]
    Lenient,
    /// Reject dates that do not parse.
    Strict,
}

impl DatePolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

/// A validated lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub claim_code: String,
    pub national_id: String,
    pub captcha_token: Option<String>,
}

const CAPTCHA_TOKEN: &str = "captchaToken";

/// Parse a request body into a JSON value.
pub fn parse_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::NotAnObject);
    }
    serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}

/// Validate a lookup payload.
pub fn validate_query(payload: &Value) -> Result<ValidatedQuery, ValidationError> {
    let object = as_object(payload)?;
    let fields = check_fields(object, QUERY_FIELDS, DatePolicy::Lenient)?;

    let captcha_token = match object.get(CAPTCHA_TOKEN) {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) if token.is_empty() => None,
        Some(Value::String(token)) => Some(token.clone()),
        Some(_) => return Err(ValidationError::NotAString(CAPTCHA_TOKEN)),
    };

    Ok(ValidatedQuery {
        claim_code: fields.take("claimCode"),
        national_id: fields.take("nationalId"),
        captcha_token,
    })
}

/// Validate an append payload.
pub fn validate_append(payload: &Value, dates: DatePolicy) -> Result<NewLeaveRecord, ValidationError> {
    let object = as_object(payload)?;
    let fields = check_fields(object, APPEND_FIELDS, dates)?;

    Ok(NewLeaveRecord {
        claim_code: fields.take("claimCode"),
        national_id: fields.take("nationalId"),
        holder_name: fields.take("holderName"),
        report_date: fields.take("reportDate"),
        start_date: fields.take("startDate"),
        end_date: fields.take("endDate"),
        issuing_physician: fields.take("issuingPhysician"),
        job_title: fields.take("jobTitle"),
    })
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or(ValidationError::NotAnObject)
}

/// Field values that passed every rule of a table.
struct CheckedFields<'a> {
    values: Vec<(&'static str, &'a str)>,
}

impl CheckedFields<'_> {
    fn take(&self, name: &str) -> String {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.to_string())
            .unwrap_or_default()
    }
}

fn check_fields<'a>(
    object: &'a Map<String, Value>,
    table: &[FieldRule],
    dates: DatePolicy,
) -> Result<CheckedFields<'a>, ValidationError> {
    let values = table
        .iter()
        .map(|rule| rule.check(object, dates).map(|value| (rule.name, value)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CheckedFields { values })
}
