use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Shown in place of a timestamp token whose epoch cannot be represented.
pub const UNKNOWN_TIMESTAMP: &str = "Unknown Timestamp";

const SHORT_TIME: &str = "%-I:%M %p";
const LONG_TIME: &str = "%-I:%M:%S %p";
const SHORT_DATE: &str = "%m/%d/%Y";
const LONG_DATE: &str = "%B %-d, %Y";
const SHORT_DATE_TIME: &str = "%B %-d, %Y %-I:%M %p";
const LONG_DATE_TIME: &str = "%A, %B %-d, %Y %-I:%M %p";

/// Display style letter carried by a `<t:EPOCH:S>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    ShortTime,
    LongTime,
    ShortDate,
    LongDate,
    ShortDateTime,
    LongDateTime,
    Relative,
}

impl TimestampStyle {
    pub fn from_letter(letter: Option<&str>) -> Self {
        match letter {
            Some("t") => Self::ShortTime,
            Some("T") => Self::LongTime,
            Some("d") => Self::ShortDate,
            Some("D") => Self::LongDate,
            Some("F") => Self::LongDateTime,
            Some("R") => Self::Relative,
            _ => Self::ShortDateTime,
        }
    }
}

/// A formatted timestamp token: the styled text plus the full date for hover.
/// Relative stamps still lead with the absolute date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub text: String,
    pub full: String,
}

/// Time zone and clock used while rendering. Tests pin both.
#[derive(Debug, Clone)]
pub struct RenderContext<Tz: TimeZone> {
    tz: Tz,
    now: DateTime<Utc>,
}

impl RenderContext<Local> {
    pub fn local() -> Self {
        Self::new(Local, Utc::now())
    }
}

impl<Tz: TimeZone> RenderContext<Tz>
where
    Tz::Offset: fmt::Display,
{
    pub fn new(tz: Tz, now: DateTime<Utc>) -> Self {
        Self { tz, now }
    }

    /// Format an epoch-seconds token. `None` when the epoch is out of range.
    pub fn stamp(&self, epoch: &str, style: TimestampStyle) -> Option<Stamp> {
        let secs: i64 = epoch.parse().ok()?;
        let utc = DateTime::from_timestamp(secs, 0)?;
        let local = utc.with_timezone(&self.tz);
        let full = local.format(LONG_DATE_TIME).to_string();

        let text = match style {
            TimestampStyle::ShortTime => local.format(SHORT_TIME).to_string(),
            TimestampStyle::LongTime => local.format(LONG_TIME).to_string(),
            TimestampStyle::ShortDate => local.format(SHORT_DATE).to_string(),
            TimestampStyle::LongDate => local.format(LONG_DATE).to_string(),
            TimestampStyle::ShortDateTime => local.format(SHORT_DATE_TIME).to_string(),
            TimestampStyle::LongDateTime => full.clone(),
            TimestampStyle::Relative => format!(
                "{} ({})",
                local.format(SHORT_DATE_TIME),
                relative(secs.saturating_sub(self.now.timestamp()))
            ),
        };
        Some(Stamp { text, full })
    }

    /// Hour and minute of an RFC 3339 timestamp, for the message header.
    pub fn short_time(&self, iso: &str) -> Option<String> {
        let parsed = DateTime::parse_from_rfc3339(iso.trim()).ok()?;
        Some(parsed.with_timezone(&self.tz).format("%I:%M %p").to_string())
    }
}

/// "in 3 hours" / "2 days ago" for a signed offset from now, in seconds.
pub fn relative(delta_secs: i64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let abs = delta_secs.unsigned_abs();
    let (n, unit) = match abs {
        0 => return "now".to_string(),
        a if a < MINUTE => (a, "second"),
        a if a < HOUR => (a / MINUTE, "minute"),
        a if a < DAY => (a / HOUR, "hour"),
        a if a < MONTH => (a / DAY, "day"),
        a if a < YEAR => (a / MONTH, "month"),
        a => (a / YEAR, "year"),
    };
    let plural = if n == 1 { "" } else { "s" };

    if delta_secs < 0 {
        format!("{} {}{} ago", n, unit, plural)
    } else {
        format!("in {} {}{}", n, unit, plural)
    }
}
