//! Operator-facing timestamp and next-run formatting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Layout of every timestamp in diagnostic output.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `at` as wall-clock time in `timezone`.
pub fn format_time(at: DateTime<Utc>, timezone: Tz) -> String {
    at.with_timezone(&timezone).format(TIME_FORMAT).to_string()
}

/// Startup summary line for one window.
///
/// The next run is always shown in the process zone; when the window runs
/// in a different zone its local time is appended.
pub fn next_run_line(name: &str, next_run: DateTime<Utc>, default_tz: Tz, window_tz: Tz) -> String {
    let mut line = format!(
        "\"{}\" Nextrun: {} ({})",
        name,
        format_time(next_run, default_tz),
        default_tz.name()
    );
    if window_tz != default_tz {
        line.push_str(&format!(
            " / {}({})",
            format_time(next_run, window_tz),
            window_tz.name()
        ));
    }
    line
}
