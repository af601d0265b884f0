//! Majority-vote debouncing of raw anomaly flags

/// Number of raw decisions retained.
pub const DEBOUNCE_WINDOW: usize = 3;

/// Raw anomalies within the window needed for a stable anomaly.
pub const DEBOUNCE_QUORUM: usize = 2;

/// Sliding window of the last three raw flags, seeded with `false`.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    history: [bool; DEBOUNCE_WINDOW],
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw flag and return the stable decision.
    pub fn push(&mut self, raw_anomaly: bool) -> bool {
        self.history.rotate_left(1);
        self.history[DEBOUNCE_WINDOW - 1] = raw_anomaly;
        self.is_stable_anomaly()
    }

    pub fn is_stable_anomaly(&self) -> bool {
        self.history.iter().filter(|flag| **flag).count() >= DEBOUNCE_QUORUM
    }

    /// Flags oldest first.
    pub fn history(&self) -> [bool; DEBOUNCE_WINDOW] {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_of_three() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.history(), [false, false, false]);

        assert!(!debouncer.push(true));
        assert!(debouncer.push(true));
        assert!(debouncer.push(false));
        assert_eq!(debouncer.history(), [true, true, false]);

        assert!(!debouncer.push(false));
    }

    #[test]
    fn test_single_spike_suppressed() {
        let mut debouncer = Debouncer::new();
        let decisions: Vec<bool> = [false, true, false, false, true, false]
            .into_iter()
            .map(|raw| debouncer.push(raw))
            .collect();
        assert!(decisions.iter().all(|d| !d));
    }
}
