//! Timestamp helpers shared by the UI layer and the core.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{NudgeError, Result};

/// Format used for due times in lists and email bodies.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Date entry format (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time entry format (`HH:MM`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Current local wall-clock time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Combine a `YYYY-MM-DD` date string and an `HH:MM` time string into a
/// local timestamp.
pub fn parse_reminder_time(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = date.trim();
    let time = time.trim();
    if date.is_empty() || time.is_empty() {
        return Err(NudgeError::validation("Please enter both date and time"));
    }

    let d = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| {
        NudgeError::validation("Please enter valid date (YYYY-MM-DD) and time (HH:MM)")
    })?;
    let t = NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|_| {
        NudgeError::validation("Please enter valid date (YYYY-MM-DD) and time (HH:MM)")
    })?;
    Ok(d.and_time(t))
}

/// Default date and time strings for a new-task form: today, and one hour
/// from now.
pub fn default_form_values(now: NaiveDateTime) -> (String, String) {
    let date = now.format(DATE_FORMAT).to_string();
    let time = (now + chrono::Duration::hours(1))
        .format(TIME_FORMAT)
        .to_string();
    (date, time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_and_time() {
        let ts = parse_reminder_time("2025-03-01", "09:30").unwrap();
        assert_eq!(ts.format(DISPLAY_FORMAT).to_string(), "2025-03-01 09:30");
    }

    #[test]
    fn trims_input() {
        assert!(parse_reminder_time(" 2025-03-01 ", " 09:30 ").is_ok());
    }

    #[test]
    fn rejects_empty_parts() {
        let err = parse_reminder_time("", "09:30").unwrap_err();
        assert!(err.to_string().contains("both date and time"), "got: {err}");
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            parse_reminder_time("2025-13-01", "09:30"),
            Err(NudgeError::Validation(_))
        ));
        assert!(matches!(
            parse_reminder_time("2025-03-01", "25:00"),
            Err(NudgeError::Validation(_))
        ));
        assert!(matches!(
            parse_reminder_time("tomorrow", "noon"),
            Err(NudgeError::Validation(_))
        ));
    }

    #[test]
    fn form_defaults_one_hour_ahead() {
        let now = parse_reminder_time("2025-03-01", "23:30").unwrap();
        let (date, time) = default_form_values(now);
        assert_eq!(date, "2025-03-01");
        assert_eq!(time, "00:30");
    }
}
