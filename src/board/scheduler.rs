use std::time::{Duration, Instant};

/// Trailing-edge debounce for saves.
///
/// A deferred request (re)arms the deadline; an immediate flush cancels it.
/// The owner polls with [`SaveScheduler::poll`] and performs the write itself,
/// so both triggers share one write path.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or push back) the deferred save.
    pub fn request_deferred(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop any pending deferred save. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the quiet period has elapsed; disarms the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_fires_after_quiet_period() {
        let mut s = SaveScheduler::new(DELAY);
        let t0 = Instant::now();
        s.request_deferred(t0);
        assert!(!s.poll(t0 + Duration::from_millis(499)));
        assert!(s.poll(t0 + DELAY));
        assert!(!s.is_pending());
        assert!(!s.poll(t0 + DELAY * 2));
    }

    #[test]
    fn test_new_request_restarts_timer() {
        let mut s = SaveScheduler::new(DELAY);
        let t0 = Instant::now();
        s.request_deferred(t0);
        s.request_deferred(t0 + Duration::from_millis(400));
        assert!(!s.poll(t0 + Duration::from_millis(600)));
        assert!(s.poll(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn test_cancel() {
        let mut s = SaveScheduler::new(DELAY);
        assert!(!s.cancel());
        let t0 = Instant::now();
        s.request_deferred(t0);
        assert!(s.cancel());
        assert!(!s.poll(t0 + DELAY));
    }
}
