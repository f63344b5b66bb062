use std::time::Duration;

/// Time spent in the current trial phase, with an optional limit.
///
/// Without a limit the timer never runs out and keeps counting, which is how open-ended
/// phases such as waiting for a click measure their response time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimer {
    elapsed: Duration,
    limit: Option<Duration>,
}

impl PhaseTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit: Some(limit),
        }
    }

    pub fn open_ended(limit: Option<Duration>) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn is_up(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed >= limit)
    }

    /// Fraction of the limit used so far, in `[0, 1]`. Open-ended timers report 0.
    pub fn progress(&self) -> f32 {
        match self.limit {
            Some(limit) if !limit.is_zero() => {
                (self.elapsed.as_secs_f32() / limit.as_secs_f32()).min(1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.is_up() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_reports_up_at_or_past_limit() {
        let mut t = PhaseTimer::new(Duration::from_secs(2));
        assert!(!t.is_up());
        t.tick(Duration::from_secs(2));
        assert!(t.is_up());
        assert_eq!(t.progress(), 1.0);

        // Once up, it stays up and doesn't keep accumulating.
        t.tick(Duration::from_secs(5));
        assert_eq!(t.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn open_ended_timer_keeps_counting() {
        let mut t = PhaseTimer::open_ended(None);
        for _ in 0..100 {
            t.tick(Duration::from_secs(1));
        }
        assert!(!t.is_up());
        assert_eq!(t.elapsed(), Duration::from_secs(100));
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn progress_is_fraction_of_limit() {
        let mut t = PhaseTimer::new(Duration::from_secs(8));
        t.tick(Duration::from_secs(2));
        assert!((t.progress() - 0.25).abs() < 1e-6);
    }
}
