//! Pure time-window evaluation over minute-of-day integers.

/// Parse `"HH:MM"` to minutes of day. `None` for a missing colon or a
/// non-numeric component — the caller skips the record, it never errors a
/// batch.
pub fn parse_minutes(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// A schedule's duty window, already validated to numeric minutes.
///
/// `end <= start` means the window wraps past midnight; `start == end` is
/// deliberately folded into that rule, which makes the window cover the
/// whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyWindow {
    pub start: u32,
    pub end: u32,
}

impl DutyWindow {
    pub fn parse(start_time: &str, end_time: &str) -> Option<Self> {
        Some(Self {
            start: parse_minutes(start_time)?,
            end: parse_minutes(end_time)?,
        })
    }

    pub fn is_overnight(&self) -> bool {
        self.end <= self.start
    }

    /// Is a guard with this window on duty at `now` minutes of day?
    pub fn covers(&self, now: u32) -> bool {
        if self.is_overnight() {
            now >= self.start || now < self.end
        } else {
            self.start <= now && now < self.end
        }
    }

    /// A same-day window, anchored to today, has fully ended.
    pub fn ended_same_day(&self, now: u32) -> bool {
        !self.is_overnight() && now >= self.end
    }

    /// An overnight window, anchored to *yesterday*, has crossed its end
    /// time today.
    pub fn ended_overnight(&self, now: u32) -> bool {
        self.is_overnight() && now >= self.end
    }
}
