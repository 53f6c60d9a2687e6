/// Change in visibility of the global loading indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingTransition {
    Show,
    Hide,
    Unchanged,
}

/// Reference counter behind the global loading indicator.
///
/// Overlapping operations share one indicator: it shows when the first one
/// starts and hides when the last one stops. Extra `stop` calls are ignored.
#[derive(Debug, Default)]
pub struct LoadingTracker {
    active: usize,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> LoadingTransition {
        self.active += 1;
        if self.active == 1 {
            LoadingTransition::Show
        } else {
            LoadingTransition::Unchanged
        }
    }

    pub fn stop(&mut self) -> LoadingTransition {
        match self.active {
            0 => LoadingTransition::Unchanged,
            1 => {
                self.active = 0;
                LoadingTransition::Hide
            }
            _ => {
                self.active -= 1;
                LoadingTransition::Unchanged
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_operation() {
        let mut tracker = LoadingTracker::new();
        assert_eq!(tracker.start(), LoadingTransition::Show);
        assert!(tracker.is_loading());
        assert_eq!(tracker.stop(), LoadingTransition::Hide);
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_nested_operations() {
        let mut tracker = LoadingTracker::new();
        assert_eq!(tracker.start(), LoadingTransition::Show);
        assert_eq!(tracker.start(), LoadingTransition::Unchanged);
        assert_eq!(tracker.stop(), LoadingTransition::Unchanged);
        assert!(tracker.is_loading());
        assert_eq!(tracker.stop(), LoadingTransition::Hide);
    }

    #[test]
    fn test_stop_at_zero_is_noop() {
        let mut tracker = LoadingTracker::new();
        assert_eq!(tracker.stop(), LoadingTransition::Unchanged);
        assert_eq!(tracker.start(), LoadingTransition::Show);
    }
}
