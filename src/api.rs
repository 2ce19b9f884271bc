// API client module: a small blocking HTTP client that talks to the
// Gateway. Every operation is one request with a fixed timeout; the decoded
// JSON is then handed to the envelope checker before anyone looks at it.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::endpoint::{self, Endpoint};
use crate::envelope;
use crate::error::{CgError, Result};

/// Fixed per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(50);

const REDACTED: &str = "*******";

/// Flat key/value request parameters, sent as query string or form body.
pub type Params = Vec<(&'static str, String)>;

/// How the HTTP client is built for one invocation.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Skip TLS certificate verification. Off unless asked for.
    pub insecure: bool,
    /// Skip the localhost/private-address check on the endpoint.
    pub allow_private: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            timeout: REQUEST_TIMEOUT,
            insecure: false,
            allow_private: false,
        }
    }
}

/// Blocking Gateway client: the reqwest client, the base endpoint and the
/// options it was built with.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Endpoint,
    allow_private: bool,
}

impl ApiClient {
    pub fn new(endpoint: Endpoint, options: &ClientOptions) -> Result<Self> {
        if options.insecure {
            warn!("TLS certificate verification is disabled");
        }
        let client = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()
            .map_err(|e| CgError::Transport {
                url: endpoint.to_string(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(ApiClient {
            client,
            endpoint,
            allow_private: options.allow_private,
        })
    }

    /// Perform one request against `resource` and return the decoded JSON
    /// body as-is. GET/DELETE send `params` as a query string, POST/PUT as a
    /// form-encoded body.
    pub fn request(
        &self,
        method: Method,
        resource: &str,
        params: &[(&'static str, String)],
        headers: HeaderMap,
    ) -> Result<Value> {
        let url = self.endpoint.resource(resource)?;
        if !self.allow_private {
            endpoint::validate(&url)?;
        }

        debug!("URL: {}", url);
        debug!("Request: {} {}", method, resource);
        debug!(
            "Request Data (in JSON format): {}",
            pretty(&redacted(params))
        );

        let builder = if method == Method::GET || method == Method::DELETE {
            self.client.request(method, url.clone()).query(params)
        } else if method == Method::POST || method == Method::PUT {
            let body = encode_form(params);
            self.client
                .request(method, url.clone())
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .body(body)
        } else {
            return Err(CgError::InvalidArgument(format!(
                "HTTP request method {method} is not supported"
            )));
        };

        let res = builder
            .headers(headers)
            .send()
            .map_err(|e| transport_error(url.as_str(), e))?;
        let status = res.status();
        let text = res.text().map_err(|e| transport_error(url.as_str(), e))?;

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => {
                debug!("Response (in JSON format): {}", pretty(&json));
                Ok(json)
            }
            Err(_) if !status.is_success() => Err(CgError::Transport {
                url: url.to_string(),
                detail: format!("HTTP {status}"),
            }),
            Err(e) => Err(CgError::malformed(format!("response body is not JSON: {e}"))),
        }
    }

    /// Request plus envelope check: the `result` of a successful response.
    pub fn call(
        &self,
        method: Method,
        resource: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value> {
        self.call_with_headers(method, resource, params, HeaderMap::new())
    }

    pub fn call_with_headers(
        &self,
        method: Method,
        resource: &str,
        params: &[(&'static str, String)],
        headers: HeaderMap,
    ) -> Result<Value> {
        let response = self.request(method, resource, params, headers)?;
        envelope::check(response)
    }
}

/// Form-encode parameters exactly as they go on the wire.
pub fn encode_form(params: &[(&'static str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

/// Header map carrying an explicit `Content-Length` for a form body.
pub fn content_length_header(params: &[(&'static str, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(encode_form(params).len()));
    headers
}

fn transport_error(url: &str, e: reqwest::Error) -> CgError {
    if e.is_timeout() {
        CgError::Timeout {
            url: url.to_string(),
        }
    } else {
        CgError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        }
    }
}

/// Parameters as a JSON object with the password masked, for logging.
fn redacted(params: &[(&'static str, String)]) -> Value {
    let map: Map<String, Value> = params
        .iter()
        .map(|(k, v)| {
            let v = if *k == "password" { REDACTED } else { v.as_str() };
            (k.to_string(), Value::String(v.to_string()))
        })
        .collect();
    Value::Object(map)
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}
