//! Console feedback for arenactl.
//!
//! Spinners are suppressed when:
//! - `--quiet` is passed
//! - `ARENACTL_QUIET=1` is set
//! - stderr is not a TTY
//!
//! Notices from the sync commands are always printed; they are the output.

use std::io::IsTerminal;
use std::sync::OnceLock;
use std::time::Duration;

use arenactl_core::{ArenaError, Notifier};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

static QUIET_MODE: OnceLock<bool> = OnceLock::new();

/// Call once at startup with the --quiet flag value
pub fn init_quiet_mode(quiet_flag: bool) {
    let is_quiet = quiet_flag
        || std::env::var("ARENACTL_QUIET").map(|v| v == "1").unwrap_or(false)
        || !std::io::stderr().is_terminal();

    QUIET_MODE.set(is_quiet).ok();
}

pub fn is_quiet() -> bool {
    *QUIET_MODE.get().unwrap_or(&false)
}

/// Spinner for a network wait; `None` in quiet mode
pub fn spinner(msg: impl Into<String>) -> Option<ProgressBar> {
    if is_quiet() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

/// Remove a spinner without leaving a line behind
pub fn finish_clear(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

pub fn finish_error(pb: Option<ProgressBar>, msg: impl Into<String>) {
    if let Some(pb) = pb {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            pb.set_style(style);
        }
        pb.finish_with_message(format!("✗ {}", msg.into()));
    }
}

/// Run a non-interactive action under a spinner.
///
/// Notices raised while the spinner is up are printed above it.
pub async fn with_spinner_async<T, F, Fut>(msg: impl Into<String>, f: F) -> Result<T, ArenaError>
where
    F: FnOnce(ConsoleNotifier) -> Fut,
    Fut: std::future::Future<Output = Result<T, ArenaError>>,
{
    let msg = msg.into();
    let pb = spinner(&msg);
    let notifier = ConsoleNotifier::above(pb.clone());

    match f(notifier).await {
        Ok(result) => {
            finish_clear(pb);
            Ok(result)
        }
        Err(e) => {
            finish_error(pb, format!("{}: failed", msg));
            Err(e)
        }
    }
}

/// Prints notices to stdout, or above a running spinner
#[derive(Clone, Default)]
pub struct ConsoleNotifier {
    spinner: Option<ProgressBar>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn above(spinner: Option<ProgressBar>) -> Self {
        Self { spinner }
    }
}

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        match &self.spinner {
            Some(pb) if !pb.is_finished() => pb.suspend(|| println!("{}", message)),
            _ => println!("{}", message),
        }
    }
}

/// Turn a failed action into the error main reports.
///
/// Precondition and validation failures carry their own message; anything
/// else is logged in full and reported generically.
pub fn report(err: ArenaError) -> anyhow::Error {
    if err.is_user_facing() {
        return anyhow::Error::new(err);
    }
    error!(error = ?err, "unexpected failure");
    anyhow::Error::new(err).context(
        "Something went wrong talking to Are.na or the vault (run with --debug for details)",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_keeps_user_facing_message() {
        let err = report(ArenaError::MissingBlockId {
            path: "a.md".into(),
        });
        assert!(err.to_string().contains("a.md"));
    }

    #[test]
    fn test_report_wraps_unexpected() {
        let err = report(ArenaError::Http {
            status: 500,
            body: "oops".into(),
        });
        assert!(err.to_string().contains("--debug"));
        assert!(format!("{:#}", err).contains("500"));
    }
}
