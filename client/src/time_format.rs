use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::config::HANOI_UTC_OFFSET_SECS;

fn hanoi_offset() -> FixedOffset {
    FixedOffset::east_opt(HANOI_UTC_OFFSET_SECS).unwrap_or(Utc.fix())
}

pub fn to_hanoi(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    utc.with_timezone(&hanoi_offset())
}

/// Header clock: `14:05:09 · 16/10/2026`.
pub fn format_clock(utc_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(utc_ms) {
        Some(utc) => to_hanoi(utc).format("%H:%M:%S · %d/%m/%Y").to_string(),
        None => "--:--:--".to_owned(),
    }
}

/// Backend timestamps are RFC 3339; anything else is shown as sent.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => to_hanoi(dt.with_timezone(&Utc))
            .format("%H:%M %d/%m/%Y")
            .to_string(),
        Err(_) => raw.to_owned(),
    }
}

/// "just now", "5 min ago", "3 h ago", "2 days ago".
pub fn format_age(created_at: &str, now_ms: i64) -> Option<String> {
    let created = DateTime::parse_from_rfc3339(created_at).ok()?;
    let secs = (now_ms - created.timestamp_millis()) / 1000;
    Some(match secs {
        s if s < 60 => "just now".to_owned(),
        s if s < 3600 => format!("{} min ago", s / 60),
        s if s < 86_400 => format!("{} h ago", s / 3600),
        s if s < 2 * 86_400 => "1 day ago".to_owned(),
        s => format!("{} days ago", s / 86_400),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOON_UTC_MS: i64 = 1_792_065_600_000; // 2026-10-15T12:00:00Z

    #[test]
    fn clock_is_seven_hours_ahead() {
        assert_eq!(format_clock(NOON_UTC_MS), "19:00:00 · 15/10/2026");
    }

    #[test]
    fn clock_rolls_over_midnight() {
        let ms = NOON_UTC_MS + 5 * 3_600_000 + 30_000;
        assert_eq!(format_clock(ms), "00:00:30 · 16/10/2026");
    }

    #[test]
    fn timestamp_converts_to_local() {
        assert_eq!(format_timestamp("2026-10-15T02:30:00Z"), "09:30 15/10/2026");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn ages() {
        let now = NOON_UTC_MS;
        assert_eq!(format_age("2026-10-15T11:59:30Z", now).as_deref(), Some("just now"));
        assert_eq!(format_age("2026-10-15T11:15:00Z", now).as_deref(), Some("45 min ago"));
        assert_eq!(format_age("2026-10-15T09:00:00Z", now).as_deref(), Some("3 h ago"));
        assert_eq!(format_age("2026-10-12T12:00:00Z", now).as_deref(), Some("3 days ago"));
        assert_eq!(format_age("garbage", now), None);
    }
}
