// Library root
// ------------
// Client for the CyberGIS Gateway REST API. The `cg` binary (`main.rs`) is a
// thin wrapper over `cli`; everything else is usable as a library.
//
// Module responsibilities:
// - `endpoint`: base URL normalization and the localhost/private-host check.
// - `api`: the blocking HTTP invoker (one request, fixed timeout).
// - `envelope`: `{status, result}` checking; turns Gateway errors into
//   `CgError::Gateway`.
// - `token`, `app`, `job`, `version`: one function per Gateway operation,
//   each building its parameters and delegating to `api`.
// - `files`: config documents in, JSON responses out.
// - `config`: flag > env > default resolution into `Settings`.
// - `ui`, `cli`: terminal interaction and the command surface.
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod files;
pub mod job;
pub mod token;
pub mod ui;
pub mod version;

pub use api::{ApiClient, ClientOptions};
pub use endpoint::Endpoint;
pub use error::{CgError, Result};
