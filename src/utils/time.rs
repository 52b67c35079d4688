// src/utils/time.rs

use chrono::{DateTime, Local, Utc};

/// Wall-clock source, injectable so deadlines can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Countdown label, minutes and zero-padded seconds ("12:05").
pub fn format_time_left(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Start time as shown in the "not started yet" message, in the host's timezone.
pub fn format_local(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
