use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a pipeline run works through its stages; hidden outside the tui.
pub(crate) fn stage_spinner(tui: bool) -> ProgressBar {
    if !tui {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.magenta} [{elapsed_precise:.magenta}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// `====` banner printed above each run in the tui.
pub(crate) fn banner(name: &str) {
    println!(
        "{bar}\n{name:^40}\n{bar}",
        bar = "=".repeat(40),
        name = name
    );
}
