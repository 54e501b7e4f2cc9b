//! Timestamp and time-of-day utilities

use chrono::{DateTime, Local, NaiveTime, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current local wall-clock time of day
pub fn local_time_of_day() -> NaiveTime {
    Local::now().time()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Parse a wall-clock time of day in `HH:MM` or `HH:MM:SS` form
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| Error::InvalidInput(format!("Invalid time of day '{}': {}", input, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(16), Duration::from_millis(16));
    }

    #[test]
    fn test_parse_time_of_day_hours_minutes() {
        let parsed = parse_time_of_day("07:30").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_time_of_day_with_seconds() {
        let parsed = parse_time_of_day(" 23:59:58 ").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_opt(23, 59, 58).unwrap());
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        assert!(matches!(parse_time_of_day("25:00"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_time_of_day("soon"), Err(Error::InvalidInput(_))));
    }
}
