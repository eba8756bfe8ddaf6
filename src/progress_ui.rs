//! Terminal progress bar driven by download events.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use fetchit_core::{DownloadEvent, DownloadProgress};

const PERCENT_TEMPLATE: &str = "{spinner} [{bar:40}] {pos:>3}% {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {msg}";

/// Translates [`DownloadEvent`]s into an indicatif bar for one download.
///
/// The bar is created on the first progress event: a percentage bar when
/// the size is known, a spinner otherwise. `Finished` clears it.
#[derive(Debug)]
pub(crate) struct ProgressReporter {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    pub(crate) fn handle(&mut self, event: DownloadEvent<'_>) {
        match event {
            DownloadEvent::Progress(progress) => {
                let enabled = self.enabled;
                let bar = self.bar.get_or_insert_with(|| {
                    if !enabled {
                        ProgressBar::hidden()
                    } else if progress.total_bytes.is_some() {
                        styled(ProgressBar::new(100), PERCENT_TEMPLATE)
                    } else {
                        styled(ProgressBar::new_spinner(), SPINNER_TEMPLATE)
                    }
                });
                bar.set_position(u64::from(progress.percent));
                bar.set_message(progress_message(&progress));
                if progress.total_bytes.is_none() {
                    bar.tick();
                }
            }
            DownloadEvent::Finished(_) => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.bar.is_some()
    }
}

fn styled(bar: ProgressBar, template: &str) -> ProgressBar {
    bar.set_style(
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

/// `1.50 MiB / 10.00 MiB`, or just the transferred size when the total is unknown.
fn progress_message(progress: &DownloadProgress) -> String {
    let transferred = HumanBytes(progress.bytes_transferred);
    match progress.total_bytes {
        Some(total) => format!("{transferred} / {}", HumanBytes(total)),
        None => transferred.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchit_core::{DownloadOutcome, DownloadSummary};

    #[test]
    fn test_progress_message_with_known_total() {
        let message = progress_message(&DownloadProgress {
            bytes_transferred: 2048,
            total_bytes: Some(5 * 1024 * 1024),
            percent: 0,
        });
        assert_eq!(
            message,
            format!("{} / {}", HumanBytes(2048), HumanBytes(5 * 1024 * 1024))
        );
        assert!(message.contains("KiB"));
        assert!(message.contains("MiB"));
    }

    #[test]
    fn test_progress_message_with_unknown_total() {
        let message = progress_message(&DownloadProgress {
            bytes_transferred: 512,
            total_bytes: None,
            percent: 0,
        });
        assert_eq!(message, "512 B");
    }

    #[test]
    fn test_reporter_created_on_progress_and_cleared_on_finish() {
        let mut reporter = ProgressReporter::new(false);
        assert!(!reporter.is_active());

        reporter.handle(DownloadEvent::Progress(DownloadProgress {
            bytes_transferred: 10,
            total_bytes: Some(100),
            percent: 10,
        }));
        assert!(reporter.is_active());

        let outcome = DownloadOutcome::Success(DownloadSummary {
            bytes_written: 100,
            content_length: Some(100),
            path: None,
        });
        reporter.handle(DownloadEvent::Finished(&outcome));
        assert!(!reporter.is_active());
    }
}
