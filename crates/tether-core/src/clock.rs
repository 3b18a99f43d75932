use jiff::{SignedDuration, Timestamp};
use std::sync::{Arc, Mutex};

/// Source of "now" for creation, expiry and click timestamps.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// service and keep another to advance it.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            inner: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock to `target`.
    pub fn set(&self, target: Timestamp) {
        *self.lock() = target;
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.lock();
        *now = *now + by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timestamp> {
        // a poisoned lock still holds a valid timestamp
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_works() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = ManualClock::new(base);
        assert_eq!(clock.now(), base);

        clock.advance(SignedDuration::from_secs(90));
        assert_eq!(clock.now(), Timestamp::from_second(90).unwrap());

        let target = Timestamp::from_second(1000).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn clones_share_time() {
        let clock = ManualClock::new(Timestamp::from_second(0).unwrap());
        let handle = clock.clone();

        handle.advance(SignedDuration::from_secs(5));
        assert_eq!(clock.now(), Timestamp::from_second(5).unwrap());
    }
}
