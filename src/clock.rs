use chrono::{DateTime, Duration, Utc};

/// Time source for the in-memory adapter.
///
/// The durable adapter always uses the database server's clock; this trait
/// exists so the in-memory adapter can be driven deterministically in tests
/// (schedule gating, retry backoff) without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    current_time: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: std::sync::Mutex::new(initial_time),
        }
    }

    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.current_time.lock().unwrap() = time;
    }

    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set_time(start);
        assert_eq!(clock.now(), start);
    }
}
