use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone};

/// Defines how often a trigger fires, evaluated in the configured zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Repeat every N minutes (clamped to at least one).
    EveryMinutes(u32),
    /// Fire once per day at the given local wall-clock time.
    DailyAt { hour: u32, minute: u32 },
}

impl Cadence {
    /// Parse a daily `"HH:MM"` spec.
    pub fn parse_daily(hhmm: &str) -> Option<Self> {
        let (h, m) = hhmm.split_once(':')?;
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Cadence::DailyAt { hour, minute })
    }

    /// Compute the next fire instant strictly after `from`.
    ///
    /// `None` only when the local candidate time cannot be represented,
    /// which cannot happen with a fixed-offset zone; callers treat it as
    /// "never".
    pub fn next_fire(&self, from: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        match self {
            Cadence::EveryMinutes(mins) => {
                Some(from + Duration::minutes((*mins).max(1) as i64))
            }

            Cadence::DailyAt { hour, minute } => {
                let date = from.date_naive();
                let candidate = from
                    .timezone()
                    .with_ymd_and_hms(date.year(), date.month(), date.day(), *hour, *minute, 0)
                    .single()?;
                if candidate > from {
                    Some(candidate)
                } else {
                    // Today's slot has passed — advance to tomorrow.
                    Some(candidate + Duration::days(1))
                }
            }
        }
    }
}
