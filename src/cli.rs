// Command-line surface: argument definitions and dispatch onto the
// token/app/job/version components.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::{ConfigArgs, Settings};
use crate::error::CgError;
use crate::files::{self, ConfigDocument, ConfigPolicy};
use crate::job::{Computation, LaunchRequest};
use crate::token::{IssueRequest, VerifyRequest, DEFAULT_LIFETIME, MAX_LIFETIME, MIN_LIFETIME};
use crate::{app, job, token, ui, version};

const GETINFO_DEFAULT: &str = "getinfo_out.json";
const GETCONFIG_DEFAULT: &str = "getconfig_out.json";
const MONITOR_DEFAULT: &str = "monitor_job_out.json";

#[derive(Parser, Debug)]
#[command(name = "cg")]
#[command(about = "Client for the CyberGIS Gateway REST API", long_about = None)]
pub struct Args {
    /// Print progress information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print debug information, including request and response bodies
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue, verify or revoke tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCmd,
    },
    /// Register and configure applications
    App {
        #[command(subcommand)]
        cmd: AppCmd,
    },
    /// Launch and follow jobs
    Job {
        #[command(subcommand)]
        cmd: JobCmd,
    },
    /// Print the Gateway API version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum TokenCmd {
    /// Issue a token and print it
    Issue {
        /// Token lifetime in seconds
        #[arg(long, default_value_t = DEFAULT_LIFETIME,
              value_parser = clap::value_parser!(u64).range(MIN_LIFETIME..=MAX_LIFETIME))]
        lifetime: u64,
        /// Do not bind the token to this machine's IP address
        #[arg(long)]
        no_binding: bool,
        /// Keep the token for later invocations
        #[arg(long)]
        save: bool,
    },
    /// Verify a token and print its remaining lifetime in seconds
    Verify,
    /// Revoke a token
    Revoke,
}

#[derive(Subcommand, Debug)]
pub enum AppCmd {
    /// Register an app and print its name
    Register,
    /// Configure an app from a JSON file
    Configure {
        #[arg(long)]
        configfile: Option<PathBuf>,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Write app info to a JSON file
    Getinfo {
        #[arg(long)]
        destfile: Option<PathBuf>,
    },
    /// Write app configuration to a JSON file
    Getconfig {
        #[arg(long)]
        destfile: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobCmd {
    /// Launch a job and print its ID
    Launch {
        #[arg(long)]
        configfile: Option<PathBuf>,
        /// Number of CPUs to request
        #[arg(short = 'n', long)]
        ncpu: Option<u32>,
        /// Wall time to request, in minutes
        #[arg(long)]
        walltime: Option<f64>,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Write job status to a JSON file
    Monitor {
        #[arg(long)]
        destfile: Option<PathBuf>,
    },
    /// Print the HTTP URL of the job output archive
    Output,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PolicyArgs {
    /// Reject empty objects, arrays and other falsy JSON documents
    #[arg(long)]
    strict_config: bool,
}

impl PolicyArgs {
    fn policy(self) -> ConfigPolicy {
        if self.strict_config {
            ConfigPolicy::Strict
        } else {
            ConfigPolicy::Lenient
        }
    }
}

fn load_config(path: Option<PathBuf>, policy: PolicyArgs) -> Result<ConfigDocument> {
    let Some(path) = path else {
        return Err(CgError::invalid_config(None, "no config file given (use --configfile)").into());
    };
    Ok(ConfigDocument::load(&path, policy.policy())?)
}

/// Resolve configuration and run one command.
pub fn run(args: Args) -> Result<()> {
    let mut config = args.config;
    if config.prompt_password {
        config.password = Some(ui::prompt_password()?);
    }
    let fallback_url = std::env::var("CG_API").ok();
    let settings = Settings::resolve(config, fallback_url)?;
    let api = ApiClient::new(settings.endpoint.clone(), &settings.client)?;

    match args.cmd {
        Command::Token { cmd } => run_token(&api, &settings, cmd),
        Command::App { cmd } => run_app(&api, &settings, cmd),
        Command::Job { cmd } => run_job(&api, &settings, cmd),
        Command::Version => {
            let v = ui::with_spinner("Fetching version...", || version::get_version(&api))?;
            println!("{v}");
            Ok(())
        }
    }
}

fn run_token(api: &ApiClient, settings: &Settings, cmd: TokenCmd) -> Result<()> {
    match cmd {
        TokenCmd::Issue {
            lifetime,
            no_binding,
            save,
        } => {
            info!("issuing token");
            let req = IssueRequest {
                username: settings.username()?,
                password: settings.password()?,
                lifetime,
                bind_to_ip: !no_binding,
            };
            let tok = ui::with_spinner("Issuing token...", || token::issue(api, &req))?;
            if save {
                settings.token_store.save(&tok)?;
            }
            println!("{tok}");
        }
        TokenCmd::Verify => {
            let tok = settings.token()?;
            info!("verifying token \"{}\"", tok);
            let req = VerifyRequest {
                username: settings.username.as_deref().unwrap_or_default(),
                token: &tok,
                client_id: settings.clientid(),
                client_ip: settings.clientip(),
            };
            let remaining = ui::with_spinner("Verifying token...", || token::verify(api, &req))?;
            println!("{remaining}");
        }
        TokenCmd::Revoke => {
            let tok = settings.token()?;
            info!("revoking token \"{}\"", tok);
            let username = settings.username()?;
            let password = settings.password()?;
            ui::with_spinner("Revoking token...", || {
                token::revoke(api, username, password, &tok)
            })?;
            if let Err(e) = settings.token_store.clear_if(&tok) {
                warn!("token revoked but stored copy was not removed: {}", e);
            }
        }
    }
    Ok(())
}

fn run_app(api: &ApiClient, settings: &Settings, cmd: AppCmd) -> Result<()> {
    let token = settings.token()?;
    let token = token.as_str();
    let appname = settings.appname()?;
    match cmd {
        AppCmd::Register => {
            info!("registering app \"{}\"", appname);
            let username = settings.username.as_deref().unwrap_or_default();
            let name = ui::with_spinner("Registering app...", || {
                app::register(api, username, appname, token)
            })?;
            println!("{name}");
        }
        AppCmd::Configure { configfile, policy } => {
            let doc = load_config(configfile, policy)?;
            info!("configuring app \"{}\"", appname);
            ui::with_spinner("Configuring app...", || {
                app::configure(api, appname, token, &doc)
            })?;
        }
        AppCmd::Getinfo { destfile } => {
            let dest = files::output_path(destfile.as_deref(), GETINFO_DEFAULT)?;
            info!("getting app info for \"{}\"", appname);
            let result = ui::with_spinner("Fetching app info...", || {
                app::get_info(api, appname, token)
            })?;
            files::write_json(&dest, &result)?;
        }
        AppCmd::Getconfig { destfile } => {
            let dest = files::output_path(destfile.as_deref(), GETCONFIG_DEFAULT)?;
            info!("getting app config for \"{}\"", appname);
            let result = ui::with_spinner("Fetching app config...", || {
                app::get_config(api, appname, token)
            })?;
            files::write_json(&dest, &result)?;
        }
    }
    Ok(())
}

fn run_job(api: &ApiClient, settings: &Settings, cmd: JobCmd) -> Result<()> {
    let token = settings.token()?;
    let token = token.as_str();
    match cmd {
        JobCmd::Launch {
            configfile,
            ncpu,
            walltime,
            policy,
        } => {
            let jobname = settings.jobname()?;
            let appname = settings.appname()?;
            let config = load_config(configfile, policy)?;
            let req = LaunchRequest {
                token,
                jobname,
                appname,
                owner: settings.username.as_deref().unwrap_or_default(),
                config: &config,
                computation: Computation { ncpu, walltime },
            };
            let id = ui::with_spinner("Launching job...", || job::launch(api, &req))?;
            println!("{id}");
        }
        JobCmd::Monitor { destfile } => {
            let job_id = settings.jobid()?;
            let dest = files::output_path(destfile.as_deref(), MONITOR_DEFAULT)?;
            let result = ui::with_spinner("Monitoring job...", || job::monitor(api, token, job_id))?;
            files::write_json(&dest, &result)?;
        }
        JobCmd::Output => {
            let job_id = settings.jobid()?;
            let uri = ui::with_spinner("Fetching job output...", || job::output(api, token, job_id))?;
            println!("{uri}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn argument_definitions_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn lifetime_outside_gateway_bounds_is_a_usage_error() {
        let parsed = Args::try_parse_from(["cg", "token", "issue", "--lifetime", "60"]);
        assert!(parsed.is_err());
        let parsed = Args::try_parse_from(["cg", "token", "issue", "--lifetime", "7200"]).unwrap();
        match parsed.cmd {
            Command::Token {
                cmd: TokenCmd::Issue { lifetime, .. },
            } => assert_eq!(lifetime, 7200),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn numeric_switch_env_values_enable_flags() {
        std::env::set_var("CG_INSECURE", "1");
        std::env::set_var("CG_ALLOW_PRIVATE_ENDPOINT", "1");
        let parsed = Args::try_parse_from(["cg", "version"]);
        std::env::remove_var("CG_INSECURE");
        std::env::remove_var("CG_ALLOW_PRIVATE_ENDPOINT");
        let parsed = parsed.unwrap();
        assert!(parsed.config.insecure);
        assert!(parsed.config.allow_private_endpoint);
    }

    #[test]
    fn global_options_follow_subcommands() {
        let parsed = Args::try_parse_from([
            "cg", "job", "monitor", "--jobid", "42", "-r", "https://gw.example.org/rest",
        ])
        .unwrap();
        assert_eq!(parsed.config.jobid.as_deref(), Some("42"));
        assert_eq!(parsed.config.url.as_deref(), Some("https://gw.example.org/rest"));
    }
}
