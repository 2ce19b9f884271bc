// Entrypoint for the `cg` CLI.
// - Parses arguments, installs logging on stderr and hands off to `cli::run`.
// - Any failure is logged and turned into a non-zero exit code.

use cg_cli::cli::{self, Args};
use cg_cli::CgError;
use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let lvl = if args.debug {
        Level::DEBUG
    } else if args.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(lvl)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = cli::run(args) {
        error!("{:#}", e);
        let code = e.downcast_ref::<CgError>().map_or(1, CgError::exit_code);
        std::process::exit(code);
    }
    Ok(())
}
