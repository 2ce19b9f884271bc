// Token lifecycle: issue, verify, revoke.
//
// The Gateway is the only authority on a token's state. The client keeps
// no record beyond the token string it is handed.

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::api::{content_length_header, ApiClient, Params};
use crate::envelope::required_str;
use crate::error::{CgError, Result};

pub const MIN_LIFETIME: u64 = 3600;
pub const MAX_LIFETIME: u64 = 43200;
pub const DEFAULT_LIFETIME: u64 = MAX_LIFETIME;

const RESOURCE: &str = "token";

#[derive(Debug, Clone)]
pub struct IssueRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    /// Requested lifetime in seconds.
    pub lifetime: u64,
    /// Bind the token to the caller's IP address.
    pub bind_to_ip: bool,
}

#[derive(Debug, Clone)]
pub struct VerifyRequest<'a> {
    pub username: &'a str,
    pub token: &'a str,
    pub client_id: &'a str,
    pub client_ip: &'a str,
}

/// Issue a new token. Returns the token string.
pub fn issue(api: &ApiClient, req: &IssueRequest<'_>) -> Result<String> {
    if !(MIN_LIFETIME..=MAX_LIFETIME).contains(&req.lifetime) {
        return Err(CgError::InvalidArgument(format!(
            "token lifetime must be between {MIN_LIFETIME} and {MAX_LIFETIME} seconds, got {}",
            req.lifetime
        )));
    }
    let params: Params = vec![
        ("username", req.username.to_string()),
        ("password", req.password.to_string()),
        ("lifetime", req.lifetime.to_string()),
        ("binding", if req.bind_to_ip { "1" } else { "0" }.to_string()),
    ];
    let result = api.call(Method::POST, RESOURCE, &params)?;
    let token = required_str(&result, "token creation", "token")?;
    info!("token {} created successfully", token);
    Ok(token)
}

/// Verify a token on behalf of a client. Returns its remaining lifetime in
/// seconds.
pub fn verify(api: &ApiClient, req: &VerifyRequest<'_>) -> Result<u64> {
    let params: Params = vec![
        ("consumer", req.client_id.to_string()),
        ("remote_addr", req.client_ip.to_string()),
        ("token", req.token.to_string()),
        ("username", req.username.to_string()),
    ];
    let headers = content_length_header(&params);
    let result = api.call_with_headers(Method::PUT, RESOURCE, &params, headers)?;
    let lifetime = match result.get("lifetime") {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| CgError::MissingResult {
        operation: "token verification".into(),
        field: "lifetime",
    })?;
    info!("token {} verified, {} seconds remaining", req.token, lifetime);
    Ok(lifetime)
}

/// Revoke a token. Success is silent.
pub fn revoke(api: &ApiClient, username: &str, password: &str, token: &str) -> Result<()> {
    let params: Params = vec![
        ("username", username.to_string()),
        ("password", password.to_string()),
        ("token", token.to_string()),
    ];
    api.call(Method::DELETE, RESOURCE, &params)?;
    info!("token {} successfully revoked", token);
    Ok(())
}
