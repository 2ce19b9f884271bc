// Gateway API version lookup.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

use crate::api::ApiClient;
use crate::envelope::{required_str, Envelope};
use crate::error::{CgError, Result};

/// Shapes the version endpoint has answered with across Gateway revisions.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionResponse {
    /// `{"status": "success", "result": {"version": ...}}`
    Enveloped(Value),
    /// `{"version": ...}`
    Bare(String),
}

impl VersionResponse {
    pub fn from_json(response: Value) -> Result<Self> {
        if response.get("status").is_some() {
            let result = Envelope::from_json(response)?.into_result()?;
            return Ok(VersionResponse::Enveloped(result));
        }
        match response.get("version") {
            Some(Value::String(s)) => Ok(VersionResponse::Bare(s.clone())),
            Some(Value::Number(n)) => Ok(VersionResponse::Bare(n.to_string())),
            _ => Err(CgError::malformed(
                "response has neither \"status\" nor \"version\"",
            )),
        }
    }

    pub fn version(self) -> Result<String> {
        match self {
            VersionResponse::Enveloped(result) => {
                required_str(&result, "version retrieval", "version")
            }
            VersionResponse::Bare(v) => Ok(v),
        }
    }
}

/// Unauthenticated version query.
pub fn get_version(api: &ApiClient) -> Result<String> {
    let response = api.request(Method::GET, "version", &[], HeaderMap::new())?;
    VersionResponse::from_json(response)?.version()
}
