//! Daily wall-clock trigger in a fixed UTC offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};

use campus_common::error::AppError;

/// Fires once per day at `time`, read in the fixed `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
    offset: FixedOffset,
}

impl DailySchedule {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    /// Parse `HH:MM` and `±HH:MM` (e.g. `08:00`, `+05:30`).
    pub fn parse(time: &str, offset: &str) -> Result<Self, AppError> {
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|_| AppError::Config(format!("invalid digest time '{time}', expected HH:MM")))?;
        let offset = parse_offset(offset.trim())?;
        Ok(Self::new(time, offset))
    }

    /// The first instant strictly after `now` at which the trigger fires.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.offset).date_naive();
        let local_fire = local_date.and_time(self.time);
        let mut fire =
            (local_fire - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc();

        if fire <= now {
            fire += Duration::days(1);
        }
        fire
    }
}

fn parse_offset(raw: &str) -> Result<FixedOffset, AppError> {
    let invalid = || AppError::Config(format!("invalid UTC offset '{raw}', expected ±HH:MM"));

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
