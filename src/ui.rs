// UI layer: the bits of terminal interaction the commands need, a hidden
// password prompt and a spinner on stderr while a request is in flight.

use std::time::Duration;

use anyhow::Result;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};

/// Ask for the Gateway password without echoing it.
pub fn prompt_password() -> Result<String> {
    let password: String = Password::new()
        .with_prompt("Enter CG Password")
        .interact()?;
    Ok(password)
}

/// Run `f` with a spinner showing `msg`. The spinner draws to stderr and
/// stays hidden when stderr is not a terminal.
pub fn with_spinner<T>(msg: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}
