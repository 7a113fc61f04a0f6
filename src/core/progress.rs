//! Progress reporting for heal runs using indicatif.
//!
//! Bars are only drawn when stderr is a terminal; otherwise every helper
//! returns a hidden bar so callers never branch on TTY state themselves.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::controller::IterationResult;

/// Style templates.
pub mod styles {
    use super::*;

    /// Bar used when healing several files at once.
    pub fn file_progress() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Per-file iteration spinner.
    pub fn iteration_spinner() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

/// Check if stderr is a TTY (for deciding whether to show progress bars).
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Create a file-count bar, hidden when stderr is not a terminal.
pub fn create_file_progress(total: usize) -> ProgressBar {
    if is_tty() {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(styles::file_progress());
        bar
    } else {
        ProgressBar::hidden()
    }
}

/// Spinner that follows one heal run iteration by iteration.
pub struct HealProgress {
    bar: ProgressBar,
    ceiling: usize,
}

impl HealProgress {
    /// Create a spinner for `name`; hidden unless `visible` and stderr is a TTY.
    pub fn new(name: &str, ceiling: usize, visible: bool) -> Self {
        let bar = if visible && is_tty() {
            let bar = ProgressBar::new_spinner();
            bar.set_style(styles::iteration_spinner());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(name.to_string());
        bar.set_message("sensing");
        Self { bar, ceiling }
    }

    /// Observer hook for [`Engine::heal_with_observer`](crate::engine::Engine::heal_with_observer).
    pub fn observe(&self, iteration: &IterationResult) {
        self.bar.set_message(Self::describe(iteration, self.ceiling));
        self.bar.tick();
    }

    /// Stop the spinner and leave a final status line.
    pub fn finish(&self, summary: impl Into<String>) {
        self.bar.finish_with_message(summary.into());
    }

    fn describe(iteration: &IterationResult, ceiling: usize) -> String {
        if iteration.converged {
            return format!("iteration {}/{}: converged", iteration.index, ceiling);
        }
        let mut msg = format!(
            "iteration {}/{}: cost {:.2} -> {:.2}, {} action(s)",
            iteration.index,
            ceiling,
            iteration.cost_before,
            iteration.cost_after,
            iteration.actions.len()
        );
        if iteration.rolled_back {
            msg.push_str(" (rolled back)");
        }
        msg
    }

    /// The underlying bar.
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}
