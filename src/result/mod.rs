//! Normalization of the store's heterogeneous response shapes.
//!
//! The wire protocol answers one request with a list of per-statement
//! envelopes. Each envelope is either `{status, result}`, a bare list, or a
//! bare scalar (version strings, counts). Everything is decoded once, here,
//! into [`ResultEnvelope`] so the rest of the crate never touches raw shapes.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{DbError, Result};

/// One statement's result, decoded at the wire boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope {
    /// Statement succeeded; payload may be a list, a scalar, or null.
    Ok(Value),
    /// Statement failed; carries the driver's message.
    Failed(String),
}

impl ResultEnvelope {
    /// Decode one raw wire value into a tagged envelope.
    ///
    /// An object carrying a `status` field is a status-wrapped envelope; any
    /// other shape (bare list, bare scalar, plain record object) is treated
    /// as a successful payload.
    pub fn decode(raw: Value) -> Self {
        match raw {
            Value::Object(mut map) if map.contains_key("status") => {
                let status = map
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                if status.eq_ignore_ascii_case("ok") {
                    Self::Ok(map.remove("result").unwrap_or(Value::Null))
                } else {
                    let message = map
                        .remove("result")
                        .as_ref()
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("statement status {status}"));
                    Self::Failed(message)
                }
            }
            other => Self::Ok(other),
        }
    }

    /// Decode a full response, one envelope per statement.
    pub fn decode_all(raw: Vec<Value>) -> Vec<Self> {
        raw.into_iter().map(Self::decode).collect()
    }
}

/// Normalize every envelope, propagating the first non-OK status.
pub fn query(envelopes: Vec<ResultEnvelope>) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(envelopes.len());
    for envelope in envelopes {
        match envelope {
            ResultEnvelope::Ok(value) => values.push(value),
            ResultEnvelope::Failed(message) => return Err(DbError::Query(message)),
        }
    }
    Ok(values)
}

/// Extract a single value from the first envelope.
///
/// An OK list yields its first element, or [`DbError::NotFound`] when empty.
/// An OK non-list passes through unchanged, so scalar results (version
/// strings, counts) survive intact.
pub fn query_one(envelopes: Vec<ResultEnvelope>) -> Result<Value> {
    let first = envelopes
        .into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound("response contained no result".to_string()))?;

    match first {
        ResultEnvelope::Failed(message) => Err(DbError::Query(message)),
        ResultEnvelope::Ok(Value::Array(items)) => items
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound("query returned no rows".to_string())),
        ResultEnvelope::Ok(value) => Ok(value),
    }
}

/// Run the status check across every envelope, discarding the values.
pub fn execute(envelopes: Vec<ResultEnvelope>) -> Result<()> {
    query(envelopes).map(|_| ())
}

/// Unwrap a possibly nested value and convert it into `T`.
///
/// Lists collapse to their first element (empty list is [`DbError::NotFound`])
/// and status-wrapped objects collapse to their `result` field, repeatedly,
/// until the value is no longer wrappable. The final conversion failure is a
/// [`DbError::TypeMismatch`], never a panic.
pub fn unmarshal<T: DeserializeOwned>(mut value: Value) -> Result<T> {
    loop {
        match value {
            Value::Array(items) => {
                value = items
                    .into_iter()
                    .next()
                    .ok_or_else(|| DbError::NotFound("query returned no rows".to_string()))?;
            }
            Value::Object(mut map)
                if map.contains_key("status") && map.contains_key("result") =>
            {
                value = map.remove("result").unwrap_or(Value::Null);
            }
            other => {
                return serde_json::from_value(other).map_err(|err| {
                    DbError::TypeMismatch(format!(
                        "cannot convert result into {}: {err}",
                        std::any::type_name::<T>()
                    ))
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_status_wrapped_ok() {
        let envelope = ResultEnvelope::decode(json!({"status": "OK", "result": [1, 2]}));
        assert_eq!(envelope, ResultEnvelope::Ok(json!([1, 2])));
    }

    #[test]
    fn decode_status_wrapped_error_carries_message() {
        let envelope = ResultEnvelope::decode(json!({"status": "ERR", "result": "index violation"}));
        assert_eq!(envelope, ResultEnvelope::Failed("index violation".to_string()));
    }

    #[test]
    fn decode_bare_values_pass_through() {
        assert_eq!(
            ResultEnvelope::decode(json!(["a", "b"])),
            ResultEnvelope::Ok(json!(["a", "b"]))
        );
        assert_eq!(
            ResultEnvelope::decode(json!("1.2.0")),
            ResultEnvelope::Ok(json!("1.2.0"))
        );
    }

    #[test]
    fn query_one_empty_list_is_not_found() {
        let envelopes = vec![ResultEnvelope::Ok(json!([]))];
        let err = query_one(envelopes).unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {err}");
    }

    #[test]
    fn query_one_returns_first_row() {
        let envelopes = vec![ResultEnvelope::Ok(json!([{"id": 1}, {"id": 2}]))];
        assert_eq!(query_one(envelopes).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn query_one_scalar_passes_through() {
        let envelopes = vec![ResultEnvelope::Ok(json!("surreal-1.2.0"))];
        assert_eq!(query_one(envelopes).unwrap(), json!("surreal-1.2.0"));
    }

    #[test]
    fn query_propagates_first_failed_status() {
        let envelopes = vec![
            ResultEnvelope::Ok(json!([1])),
            ResultEnvelope::Failed("boom".to_string()),
            ResultEnvelope::Ok(json!([2])),
        ];
        match query(envelopes) {
            Err(DbError::Query(message)) => assert_eq!(message, "boom"),
            other => panic!("expected QueryError, got {other:?}"),
        }
    }

    #[test]
    fn unmarshal_unwraps_nested_shapes() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct User {
            email: String,
        }

        let value = json!([{"status": "OK", "result": [{"email": "a@x.com"}]}]);
        let user: User = unmarshal(value).unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[test]
    fn unmarshal_reports_type_mismatch() {
        let err = unmarshal::<u64>(json!("not a number")).unwrap_err();
        match err {
            DbError::TypeMismatch(message) => assert!(message.contains("u64")),
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn unmarshal_empty_list_is_not_found() {
        assert!(unmarshal::<serde_json::Value>(json!([])).unwrap_err().is_not_found());
    }
}
