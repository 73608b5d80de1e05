//! Progress bars for the file-by-file pipeline loops.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

pub const NO_PROGRESS_ENV: &str = "SUMMEVAL_NO_PROGRESS";

/// Wraps an indicatif bar that is only drawn on an interactive stderr.
/// Every method is a no-op when the bar is hidden.
pub struct Progress {
    bar: Option<ProgressBar>,
}

impl Progress {
    /// A counted bar when `total` is known, a spinner otherwise.
    pub fn new(total: Option<u64>, label: &str) -> Self {
        if !is_interactive() {
            return Progress::hidden();
        }
        let bar = match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(
                    "{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
                ) {
                    pb.set_style(style.progress_chars("=> "));
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {pos} {msg}") {
                    pb.set_style(style);
                }
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            }
        };
        bar.set_prefix(label.to_string());
        Progress { bar: Some(bar) }
    }

    pub fn hidden() -> Self {
        Progress { bar: None }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    pub fn inc(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.set_message(msg.into());
        }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn is_interactive() -> bool {
    std::io::stderr().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && std::env::var_os(NO_PROGRESS_ENV).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_is_noop() {
        let progress = Progress::hidden();
        assert!(!progress.is_visible());
        progress.set_message("article #1");
        progress.inc();
        progress.finish_and_clear();
        progress.finish_and_clear();
    }

    #[test]
    fn test_progress_drop_without_finish() {
        let progress = Progress::new(Some(3), "Summarizing");
        progress.inc();
        drop(progress);
        let spinner = Progress::new(None, "Reading");
        spinner.set_message(String::from("owned"));
    }
}
