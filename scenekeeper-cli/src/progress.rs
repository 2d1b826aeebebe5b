//! Terminal progress display for the acquisition loop.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use scenekeeper_reconcile::{AcquisitionOutcome, AcquisitionProgress, AcquisitionStatus};

/// Progress bar plus one log line per outcome. Hidden under `--quiet`.
pub(crate) struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    pub(crate) fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("/-\\|"),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        };
        Self { pb }
    }

    fn switch_to_bar(&self, total: usize) {
        if self.pb.length() == Some(total as u64) {
            return;
        }
        self.pb.disable_steady_tick();
        self.pb.set_length(total as u64);
        self.pb.set_style(
            ProgressStyle::with_template("  [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
    }
}

fn status_marker(status: AcquisitionStatus) -> String {
    match status {
        AcquisitionStatus::QueuedEpisodeSearch => {
            "\u{2714}".if_supports_color(Stdout, |t| t.green()).to_string()
        }
        AcquisitionStatus::DryRunWouldQueueSearch => {
            "\u{2714}".if_supports_color(Stdout, |t| t.cyan()).to_string()
        }
        AcquisitionStatus::Failed => "\u{2718}".if_supports_color(Stdout, |t| t.red()).to_string(),
        _ => "-".if_supports_color(Stdout, |t| t.dimmed()).to_string(),
    }
}

impl AcquisitionProgress for BarProgress {
    fn on_phase(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn on_outcome(&self, current: usize, total: usize, outcome: &AcquisitionOutcome) {
        self.switch_to_bar(total);
        self.pb.suspend(|| {
            log::info!(
                "  {} [{}/{}] '{}' ({}) -> {}",
                status_marker(outcome.status),
                current,
                total,
                outcome.title,
                outcome.date.as_deref().unwrap_or("no date"),
                outcome.describe(),
            );
        });
        self.pb.set_position(current as u64);
        self.pb.set_message(outcome.status.to_string());
    }

    fn on_complete(&self, message: &str) {
        self.pb.finish_and_clear();
        log::info!("{}", message);
    }
}
