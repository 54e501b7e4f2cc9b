//! Human-readable time formatting for countdown displays
//!
//! Two formats are used by the sleep timer:
//! - Clock format (`HH:MM:SS`): the live countdown shown while the timer runs
//! - Estimate format (`Xh Ym`): the "you will sleep for" preview shown before
//!   a timer is confirmed

const SECONDS_PER_HOUR: u32 = 3600;
const SECONDS_PER_MINUTE: u32 = 60;

/// Format whole seconds as zero-padded `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so a full-day countdown renders as
/// `24:00:00`.
///
/// # Examples
///
/// ```
/// use hush_common::human_time::format_hms;
///
/// assert_eq!(format_hms(0), "00:00:00");
/// assert_eq!(format_hms(3661), "01:01:01");
/// assert_eq!(format_hms(86400), "24:00:00");
/// ```
pub fn format_hms(seconds: u32) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let mins = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Format whole seconds as a coarse `{h}h {m}m` sleep estimate.
///
/// Remaining seconds below a full minute are dropped.
///
/// # Examples
///
/// ```
/// use hush_common::human_time::format_sleep_estimate;
///
/// assert_eq!(format_sleep_estimate(27_000), "7h 30m");
/// assert_eq!(format_sleep_estimate(59), "0h 0m");
/// ```
pub fn format_sleep_estimate(seconds: u32) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let mins = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    format!("{}h {}m", hours, mins)
}
