//! Spinner shown while long backend calls (sync, upload) run.
//!
//! Use `NoopProgress` when stdout is not a terminal.

use std::{io::IsTerminal, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

/// Minimal progress interface for one long-running call.
pub trait Progress: Send + Sync {
    /// Stop and remove the spinner line.
    fn clear(&self) {}
}

/// No-op reporter for piped/headless runs.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif spinner with a steady tick.
pub struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    pub fn new(msg: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
            pb.set_style(style.tick_chars("-\\|/ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        Self { pb }
    }
}

impl Progress for SpinnerProgress {
    fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

/// A spinner on a terminal, nothing otherwise.
pub fn start(msg: &str) -> Box<dyn Progress> {
    if std::io::stdout().is_terminal() {
        Box::new(SpinnerProgress::new(msg))
    } else {
        Box::new(NoopProgress)
    }
}
