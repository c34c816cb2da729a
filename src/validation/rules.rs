//! Declarative field tables.

use serde_json::{Map, Value};

use crate::records::days::parse_instant;
use crate::validation::{DatePolicy, ValidationError};

/// Shape a field value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 8 to 20 ASCII letters or digits.
    ClaimCode,
    /// Exactly 10 ASCII digits.
    NationalId,
    /// Any non-blank string.
    Text,
    /// Non-blank string; must parse under `DatePolicy::Strict`.
    Date,
}

/// A required field and its kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn rule(name: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, kind }
}

pub const QUERY_FIELDS: &[FieldRule] = &[
    rule("claimCode", FieldKind::ClaimCode),
    rule("nationalId", FieldKind::NationalId),
];

pub const APPEND_FIELDS: &[FieldRule] = &[
    rule("claimCode", FieldKind::ClaimCode),
    rule("nationalId", FieldKind::NationalId),
    rule("holderName", FieldKind::Text),
    rule("reportDate", FieldKind::Date),
    rule("startDate", FieldKind::Date),
    rule("endDate", FieldKind::Date),
    rule("issuingPhysician", FieldKind::Text),
    rule("jobTitle", FieldKind::Text),
];

impl FieldRule {
    /// Check this field in `object`, returning its string value.
    pub fn check<'a>(&self, object: &'a Map<String, Value>, dates: DatePolicy) -> Result<&'a str, ValidationError> {
        let value = match object.get(self.name) {
            None | Some(Value::Null) => return Err(ValidationError::Missing(self.name)),
            Some(Value::String(value)) => value.as_str(),
            Some(_) => return Err(ValidationError::NotAString(self.name)),
        };

        match self.kind {
            FieldKind::ClaimCode => {
                let ok = (8..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_alphanumeric());
                ok.then_some(value).ok_or(ValidationError::Format(self.name))
            }
            FieldKind::NationalId => {
                let ok = value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit());
                ok.then_some(value).ok_or(ValidationError::Format(self.name))
            }
            FieldKind::Text => non_blank(self.name, value),
            FieldKind::Date => {
                let value = non_blank(self.name, value)?;
                if dates == DatePolicy::Strict && parse_instant(value).is_none() {
                    return Err(ValidationError::Date(self.name));
                }
                Ok(value)
            }
        }
    }
}

fn non_blank<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(name))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_start_with_lookup_key() {
        for table in [QUERY_FIELDS, APPEND_FIELDS] {
            assert_eq!(table[0].name, "claimCode");
            assert_eq!(table[1].name, "nationalId");
        }
        assert_eq!(APPEND_FIELDS.len(), 8);
    }

    #[test]
    fn test_claim_code_bounds() {
        let rule = rule("claimCode", FieldKind::ClaimCode);
        for (input, ok) in [("ABCDEFG1", true), ("ABCDEFG", false), ("A1B2C3D4E5F6G7H8I9J0", true), ("A1B2C3D4E5F6G7H8I9J0K", false)] {
            let mut map = Map::new();
            map.insert("claimCode".into(), Value::String(input.into()));
            assert_eq!(rule.check(&map, DatePolicy::Lenient).is_ok(), ok, "{input}");
        }
    }
}
