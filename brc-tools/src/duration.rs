//! Short, human-readable duration rendering.
//!
//! Adapted from the systemd.time-inspired `TimeSpan` formatter used
//! throughout the wider proxmox tooling: a duration is broken into its
//! largest non-zero units and printed most-significant-first.

use std::time::Duration;

#[derive(Default, Clone, Debug)]
pub struct TimeSpan {
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
    pub days: u64,
    pub weeks: u64,
    pub years: u64,
}

impl From<Duration> for TimeSpan {
    fn from(duration: Duration) -> Self {
        let mut secs = duration.as_secs();
        let seconds = secs % 60;
        secs /= 60;
        let minutes = secs % 60;
        secs /= 60;
        let hours = secs % 24;
        secs /= 24;
        let years = secs / 365;
        let ydays = secs % 365;
        let weeks = ydays / 7;
        let days = ydays % 7;
        Self {
            seconds,
            minutes,
            hours,
            days,
            weeks,
            years,
        }
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        let mut do_write = |f: &mut std::fmt::Formatter<'_>, v: u64, unit: &str| -> std::fmt::Result {
            if v == 0 {
                return Ok(());
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{v}{unit}")
        };

        do_write(f, self.years, "y")?;
        do_write(f, self.weeks, "w")?;
        do_write(f, self.days, "d")?;
        do_write(f, self.hours, "h")?;
        do_write(f, self.minutes, "min")?;
        if first {
            do_write(f, self.seconds, "s")?;
        }
        if first {
            write!(f, "0s")?;
        }
        Ok(())
    }
}

/// Render `when` relative to `now` as a short duration, suffixed with
/// `" ago"` when `when` is in the past.
pub fn render_relative(when: i64, now: i64) -> String {
    if when >= now {
        let span: TimeSpan = Duration::from_secs((when - now) as u64).into();
        span.to_string()
    } else {
        let span: TimeSpan = Duration::from_secs((now - when) as u64).into();
        format!("{span} ago")
    }
}
