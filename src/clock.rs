//! All things time-related.

pub use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Tells time and returns the time.
///
/// Generally you will want to retrieve time using [`SystemClock`],
/// but in tests you may want to implement a `Clock` with a fixed time.
pub trait Clock {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// The moment `days` days before [`Clock::now()`].
    fn days_ago(&self, days: u32) -> DateTime<Utc> {
        self.now() - TimeDelta::days(i64::from(days))
    }
}

/// Interacts with the system clock to get the current time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
