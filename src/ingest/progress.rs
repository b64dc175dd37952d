//! Progress Reporting
//!
//! The store pass reports the source line it has reached, measured against
//! the line count of the validate pass. Observers are notified each time a
//! step boundary is crossed and once when the pass finishes.

/// Snapshot handed to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Source lines processed
    pub value: u32,
    /// Source lines in the document
    pub max: u32,
}

impl Progress {
    /// Completion in percent, 100 for empty documents
    pub fn percent(&self) -> u32 {
        if self.max == 0 {
            return 100;
        }
        ((u64::from(self.value.min(self.max)) * 100) / u64::from(self.max)) as u32
    }
}

/// Receiver of progress notifications
pub trait ProgressObserver {
    /// Called with the current progress
    fn update(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressObserver for F {
    fn update(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Line counter with step-wise notification
#[derive(Debug, Clone)]
pub struct ProgressIndicator {
    value: u32,
    max: u32,
    step: u32,
    /// Step index of the last notification
    reported: u32,
}

impl ProgressIndicator {
    /// Create an indicator for `max` lines, notifying every `step` lines
    pub fn new(max: u32, step: u32) -> Self {
        Self {
            value: 0,
            max,
            step: step.max(1),
            reported: 0,
        }
    }

    /// Current progress
    pub fn progress(&self) -> Progress {
        Progress {
            value: self.value,
            max: self.max,
        }
    }

    /// Record the current line, returning a notification if a step boundary
    /// was crossed
    pub fn set_value(&mut self, value: u32) -> Option<Progress> {
        self.value = value;
        let step = value / self.step;
        if step > self.reported {
            self.reported = step;
            Some(self.progress())
        } else {
            None
        }
    }

    /// Mark the pass complete
    pub fn finish(&mut self) -> Progress {
        self.value = self.max.max(self.value);
        self.progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifies_on_step_boundaries() {
        let mut indicator = ProgressIndicator::new(350, 100);
        let notified: Vec<u32> = (1..=350)
            .filter_map(|line| indicator.set_value(line))
            .map(|p| p.value)
            .collect();
        assert_eq!(notified, vec![100, 200, 300]);
        assert_eq!(indicator.finish().percent(), 100);
    }

    #[test]
    fn test_repeated_line_notifies_once() {
        let mut indicator = ProgressIndicator::new(10, 2);
        assert!(indicator.set_value(2).is_some());
        assert!(indicator.set_value(2).is_none());
        assert!(indicator.set_value(3).is_none());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |p: Progress| seen.push(p.percent());
            observer.update(Progress { value: 5, max: 10 });
        }
        assert_eq!(seen, vec![50]);
    }

    #[test]
    fn test_zero_step_is_clamped() {
        let mut indicator = ProgressIndicator::new(3, 0);
        assert!(indicator.set_value(1).is_some());
    }
}
