// Configuration resolution.
//
// Every setting comes from its flag, else its environment variable, else a
// built-in default. The result is an immutable `Settings` that is handed to
// each command; nothing below this layer looks at the environment.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};

use crate::api::ClientOptions;
use crate::endpoint::{Endpoint, DEFAULT_ENDPOINT};
use crate::error::{CgError, Result};

const TOKEN_FILE_NAME: &str = ".cg_token";

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Gateway REST endpoint (falls back to CG_API, then the public sandbox)
    #[arg(short = 'r', long = "url", env = "CG_API_URL", global = true)]
    pub url: Option<String>,

    #[arg(short = 'u', long, env = "CG_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "CG_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Prompt for the password instead of reading it from flags/env
    #[arg(short = 'p', long, global = true)]
    pub prompt_password: bool,

    #[arg(short = 't', long, env = "CG_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Where `token issue --save` keeps the token
    #[arg(long, env = "CG_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    #[arg(short = 'a', long, env = "CG_APP_NAME", global = true)]
    pub appname: Option<String>,

    #[arg(short = 'j', long, env = "CG_JOB_NAME", global = true)]
    pub jobname: Option<String>,

    #[arg(long, env = "CG_JOB_ID", global = true)]
    pub jobid: Option<String>,

    /// Client ID (token verify)
    #[arg(short = 'c', long, env = "CG_CLIENT_ID", global = true)]
    pub clientid: Option<String>,

    /// Client IP (token verify)
    #[arg(short = 'i', long, env = "CG_CLIENT_IP", global = true)]
    pub clientip: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, env = "CG_INSECURE", global = true,
          value_parser = clap::builder::FalseyValueParser::new())]
    pub insecure: bool,

    /// Allow localhost and private-network endpoints
    #[arg(long, env = "CG_ALLOW_PRIVATE_ENDPOINT", global = true,
          value_parser = clap::builder::FalseyValueParser::new())]
    pub allow_private_endpoint: bool,
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub client: ClientOptions,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub appname: Option<String>,
    pub jobname: Option<String>,
    pub jobid: Option<String>,
    pub clientid: Option<String>,
    pub clientip: Option<String>,
    pub token_store: TokenStore,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Settings {
    /// Resolve from parsed arguments. `fallback_url` is consulted when no
    /// `--url`/`CG_API_URL` was given.
    pub fn resolve(args: ConfigArgs, fallback_url: Option<String>) -> Result<Self> {
        let raw_url = non_empty(args.url)
            .or_else(|| non_empty(fallback_url))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Endpoint::parse(&raw_url)?;
        debug!("using endpoint {}", endpoint);

        let token_store = TokenStore::new(args.token_file.unwrap_or_else(TokenStore::default_path));

        Ok(Settings {
            endpoint,
            client: ClientOptions {
                insecure: args.insecure,
                allow_private: args.allow_private_endpoint,
                ..ClientOptions::default()
            },
            username: non_empty(args.username),
            password: args.password.filter(|p| !p.is_empty()),
            token: non_empty(args.token),
            appname: non_empty(args.appname),
            jobname: non_empty(args.jobname),
            jobid: non_empty(args.jobid),
            clientid: non_empty(args.clientid),
            clientip: non_empty(args.clientip),
            token_store,
        })
    }

    /// The explicit token, else the stored one. The store is only read here,
    /// so commands that need no token never touch it.
    pub fn token(&self) -> Result<String> {
        if let Some(t) = &self.token {
            return Ok(t.clone());
        }
        let stored = self.token_store.load()?;
        required(&stored, "token", "token", "CG_TOKEN").map(str::to_string)
    }

    pub fn username(&self) -> Result<&str> {
        required(&self.username, "username", "username", "CG_USERNAME")
    }

    pub fn password(&self) -> Result<&str> {
        required(&self.password, "password", "password", "CG_PASSWORD")
    }

    pub fn appname(&self) -> Result<&str> {
        required(&self.appname, "app name", "appname", "CG_APP_NAME")
    }

    pub fn jobname(&self) -> Result<&str> {
        required(&self.jobname, "job name", "jobname", "CG_JOB_NAME")
    }

    pub fn jobid(&self) -> Result<&str> {
        required(&self.jobid, "job ID", "jobid", "CG_JOB_ID")
    }

    pub fn clientid(&self) -> &str {
        self.clientid.as_deref().unwrap_or_default()
    }

    pub fn clientip(&self) -> &str {
        self.clientip.as_deref().unwrap_or_default()
    }
}

fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or(CgError::MissingSetting { name, flag, env })
}

/// Token persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    /// `~/.cg_token`, or `./.cg_token` without a home directory.
    pub fn default_path() -> PathBuf {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join(TOKEN_FILE_NAME)
    }

    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(non_empty(Some(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CgError::io(&self.path, e)),
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        fs::write(&self.path, format!("{token}\n")).map_err(|e| CgError::io(&self.path, e))?;
        info!("token saved to \"{}\"", self.path.display());
        Ok(())
    }

    /// Forget the stored token if it is `token`. Returns whether it was.
    pub fn clear_if(&self, token: &str) -> Result<bool> {
        if self.load()?.as_deref() != Some(token) {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| CgError::io(&self.path, e))?;
        info!("stored token removed from \"{}\"", self.path.display());
        Ok(true)
    }
}
