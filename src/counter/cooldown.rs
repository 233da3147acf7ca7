use std::time::Duration;

/// Minimum spacing between two counted events.
///
/// Timestamps are monotonic stream times. Nothing has fired yet means the gate
/// is open. By default the window is exclusive (strictly more than `window`
/// must pass); per-limb trackers use the inclusive form.
#[derive(Debug, Clone)]
pub struct Cooldown {
    window: Duration,
    inclusive: bool,
    last: Option<Duration>,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inclusive: false,
            last: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Ready again once exactly `window` has passed
    pub fn inclusive_millis(ms: u64) -> Self {
        Self {
            inclusive: true,
            ..Self::from_millis(ms)
        }
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        match self.last {
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                if self.inclusive {
                    elapsed >= self.window
                } else {
                    elapsed > self.window
                }
            }
            None => true,
        }
    }

    pub fn trigger(&mut self, now: Duration) {
        self.last = Some(now);
    }

    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_ready_before_first_trigger() {
        let c = Cooldown::from_millis(500);
        assert!(c.is_ready(ms(0)));
    }

    #[test]
    fn test_window_is_exclusive() {
        let mut c = Cooldown::from_millis(500);
        c.trigger(ms(1000));
        assert!(!c.is_ready(ms(1200)));
        assert!(!c.is_ready(ms(1500)));
        assert!(c.is_ready(ms(1501)));
    }

    #[test]
    fn test_inclusive_window_opens_at_boundary() {
        let mut c = Cooldown::inclusive_millis(500);
        c.trigger(ms(1000));
        assert!(!c.is_ready(ms(1499)));
        assert!(c.is_ready(ms(1500)));
    }

    #[test]
    fn test_reset_reopens() {
        let mut c = Cooldown::from_millis(500);
        c.trigger(ms(1000));
        c.reset();
        assert!(c.is_ready(ms(1001)));
        assert_eq!(c.last(), None);
    }
}
