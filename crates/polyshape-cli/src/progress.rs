use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use polyshape_core::loading::{LoadingTracker, LoadingTransition};

/// Global loading spinner shared by overlapping operations.
///
/// The spinner appears when the first operation starts and disappears when
/// the last one stops.
pub struct LoadingIndicator {
    tracker: LoadingTracker,
    bar: Option<ProgressBar>,
    enabled: bool,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self {
            tracker: LoadingTracker::new(),
            bar: None,
            enabled: true,
        }
    }

    /// Tracks operations without drawing anything.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn start(&mut self, message: &str) {
        match self.tracker.start() {
            LoadingTransition::Show if self.enabled => {
                let bar = ProgressBar::new_spinner();
                bar.enable_steady_tick(Duration::from_millis(100));
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.set_message(message.to_string());
                self.bar = Some(bar);
            }
            _ => {
                if let Some(bar) = &self.bar {
                    bar.set_message(message.to_string());
                }
            }
        }
    }

    pub fn stop(&mut self) {
        if self.tracker.stop() == LoadingTransition::Hide {
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_loading()
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_indicator_tracks_nesting() {
        let mut loading = LoadingIndicator::hidden();
        loading.start("Loading publications...");
        loading.start("Loading projects...");
        loading.stop();
        assert!(loading.is_loading());
        loading.stop();
        assert!(!loading.is_loading());
        assert!(loading.bar.is_none());
    }

    #[test]
    fn test_spinner_cleared_on_last_stop() {
        let mut loading = LoadingIndicator::new();
        loading.start("Saving...");
        assert!(loading.bar.is_some());
        loading.stop();
        assert!(loading.bar.is_none());
        loading.stop();
        assert!(!loading.is_loading());
    }
}
