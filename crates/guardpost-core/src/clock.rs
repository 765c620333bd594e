use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};

use crate::error::{GuardpostError, Result};

/// The single fixed time zone every "today"/"now" computation is anchored
/// to. Configured as a UTC offset string (`"+08:00"` in the default
/// deployment) — never the host's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone(FixedOffset);

impl Zone {
    /// Parse an offset of the form `"+HH:MM"` or `"-HH:MM"`.
    pub fn parse(offset: &str) -> Result<Self> {
        let err = || GuardpostError::InvalidZone(offset.to_string());

        let (sign, rest) = if let Some(rest) = offset.strip_prefix('+') {
            (1i32, rest)
        } else if let Some(rest) = offset.strip_prefix('-') {
            (-1i32, rest)
        } else {
            return Err(err());
        };
        let (h, m) = rest.split_once(':').ok_or_else(err)?;
        let hours: i32 = h.parse().map_err(|_| err())?;
        let minutes: i32 = m.parse().map_err(|_| err())?;
        if hours > 14 || minutes > 59 {
            return Err(err());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone)
            .ok_or_else(err)
    }

    /// The current instant expressed in this zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.0)
    }

    pub fn offset(&self) -> FixedOffset {
        self.0
    }
}

/// A zone-local snapshot of "now": the calendar day plus the minute of day
/// in `[0, 1440)`. All window evaluation runs against one of these so a
/// whole invocation sees a single consistent "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMoment {
    pub date: NaiveDate,
    pub minute_of_day: u32,
}

impl LocalMoment {
    pub fn from_datetime(dt: DateTime<FixedOffset>) -> Self {
        Self {
            date: dt.date_naive(),
            minute_of_day: dt.hour() * 60 + dt.minute(),
        }
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.date - Duration::days(1)
    }

    /// `"YYYY-MM-DD"` — the form schedule documents store their `date` in.
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn yesterday_str(&self) -> String {
        self.yesterday().format("%Y-%m-%d").to_string()
    }

    /// `"YYYY-MM"` — matched against monthly templates' `month_year`.
    pub fn month_str(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_manila_offset() {
        let zone = Zone::parse("+08:00").unwrap();
        assert_eq!(zone.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn parses_negative_half_hour_offset() {
        let zone = Zone::parse("-05:30").unwrap();
        assert_eq!(zone.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
    }

    #[test]
    fn rejects_malformed_offsets() {
        for bad in ["", "08:00", "+8", "+25:00", "+08:75", "+aa:bb"] {
            assert!(Zone::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn moment_captures_date_and_minute() {
        let zone = Zone::parse("+08:00").unwrap();
        let dt = zone
            .offset()
            .with_ymd_and_hms(2025, 3, 14, 15, 0, 0)
            .unwrap();
        let moment = LocalMoment::from_datetime(dt);
        assert_eq!(moment.date_str(), "2025-03-14");
        assert_eq!(moment.minute_of_day, 900);
        assert_eq!(moment.yesterday_str(), "2025-03-13");
        assert_eq!(moment.month_str(), "2025-03");
    }

    #[test]
    fn yesterday_crosses_month_boundary() {
        let zone = Zone::parse("+08:00").unwrap();
        let dt = zone.offset().with_ymd_and_hms(2025, 3, 1, 0, 5, 0).unwrap();
        let moment = LocalMoment::from_datetime(dt);
        assert_eq!(moment.yesterday_str(), "2025-02-28");
    }
}
