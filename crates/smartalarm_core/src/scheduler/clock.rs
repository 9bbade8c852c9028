//! Wall-clock readings at tick granularity.

use crate::model::alarm::TimeOfDay;
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Source of local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Device-local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// One tick's view of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub at: NaiveDateTime,
    pub date: NaiveDate,
    /// Minute-granularity time matched against alarms.
    pub time: TimeOfDay,
    pub second: u32,
}

impl ClockReading {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            at,
            date: at.date(),
            time: TimeOfDay::from_naive_time(at.time()),
            second: at.second(),
        }
    }

    /// Alarms only fire on the tick where seconds read `00`.
    pub fn is_top_of_minute(&self) -> bool {
        self.second == 0
    }

    /// `HH:MM:SS` for the clock display.
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.time, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::ClockReading;
    use chrono::NaiveDate;

    #[test]
    fn reading_splits_minute_and_seconds() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(7, 5, 9)
            .unwrap();
        let reading = ClockReading::new(at);
        assert_eq!(reading.time.to_string(), "07:05");
        assert_eq!(reading.display(), "07:05:09");
        assert!(!reading.is_top_of_minute());
    }
}
