// Response envelope checking.
//
// Every Gateway answer is `{"status": ..., "result": {...}}`. The decoded
// JSON is normalized into an `Envelope` right after the HTTP call and the
// rest of the crate only ever sees the `result` of a successful one.

use serde_json::Value;
use tracing::debug;

use crate::error::{CgError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure { code: i64, message: String },
}

impl Envelope {
    /// Normalize a decoded response body.
    pub fn from_json(response: Value) -> Result<Self> {
        let Value::Object(mut body) = response else {
            return Err(CgError::malformed("response is not a JSON object"));
        };
        let status = match body.get("status") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return Err(CgError::malformed("response has no \"status\"")),
        };
        let result = body.remove("result").unwrap_or(Value::Null);
        if status == "success" {
            return Ok(Envelope::Success(result));
        }
        let code = result
            .get("error_code")
            .and_then(as_i64)
            .ok_or_else(|| CgError::malformed("error response has no \"error_code\""))?;
        let message = result
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Envelope::Failure { code, message })
    }

    pub fn into_result(self) -> Result<Value> {
        match self {
            Envelope::Success(result) => Ok(result),
            Envelope::Failure { code, message } => Err(CgError::Gateway { code, message }),
        }
    }
}

/// Error codes sometimes come back as strings.
fn as_i64(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Check a decoded response and hand back its `result`.
pub fn check(response: Value) -> Result<Value> {
    debug!("checking for errors from server's response");
    let result = Envelope::from_json(response)?.into_result()?;
    debug!("response JSON indicates \"success\"");
    Ok(result)
}

/// Pull a string field out of a success `result`.
pub(crate) fn required_str(result: &Value, operation: &str, field: &'static str) -> Result<String> {
    match result.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(CgError::MissingResult {
            operation: operation.to_string(),
            field,
        }),
    }
}
