//! Cron normalization and timezone-aware fire time computation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::ScheduleError;

/// Index of the day-of-week field once the seconds field is present.
const DAY_OF_WEEK: usize = 5;

/// Rewrite a crontab-style expression into the syntax the `cron` crate parses.
///
/// Five-field lines get a leading `0` seconds field. Numeric days of the week
/// use crontab numbering (`0`-`6` from Sunday, `7` is Sunday again) and are
/// shifted onto the parser's `1`-`7` from Sunday. Day names pass through.
pub(crate) fn normalize_expression(expr: &str) -> String {
    let mut fields: Vec<String> = expr.split_whitespace().map(str::to_string).collect();
    if fields.len() == 5 {
        fields.insert(0, "0".to_string());
    }
    if matches!(fields.len(), 6 | 7) {
        fields[DAY_OF_WEEK] = shift_day_of_week(&fields[DAY_OF_WEEK]);
    }
    fields.join(" ")
}

fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(shift_day_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Shift one list item: a value, a range, either with an optional `/step`.
fn shift_day_item(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let suffix = step.map(|s| format!("/{s}")).unwrap_or_default();

    let Some((start, end)) = base.split_once('-') else {
        return match crontab_day(base) {
            Some(day) => format!("{}{suffix}", parser_day(day)),
            None => item.to_string(),
        };
    };
    let (Some(start), Some(end)) = (crontab_day(start), crontab_day(end)) else {
        return item.to_string();
    };

    if end == 7 && start > 0 {
        // Runs up to Sunday-as-7: Saturday is the parser's 7, Sunday its 1.
        let step = step.and_then(|s| s.parse::<u8>().ok()).unwrap_or(1);
        let mut days = Vec::new();
        if start < 7 {
            days.push(format!("{}-7{suffix}", start + 1));
        }
        if step > 0 && (7 - start) % step == 0 {
            days.push("1".to_string());
        }
        return days.join(",");
    }

    format!("{}-{}{suffix}", start + 1, end.min(6) + 1)
}

/// A numeric crontab day, `0..=7`.
fn crontab_day(value: &str) -> Option<u8> {
    value.parse::<u8>().ok().filter(|day| *day <= 7)
}

/// Crontab day to the parser's numbering, where Sunday is `1`.
fn parser_day(day: u8) -> u8 {
    day % 7 + 1
}

/// A parsed cron schedule bound to the timezone it is evaluated in.
#[derive(Clone)]
pub struct JobSchedule {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
}

impl JobSchedule {
    /// Parse `expression` for evaluation in `timezone`.
    ///
    /// Fails if the parser rejects the expression or if it never fires again
    /// (e.g. a year field entirely in the past).
    pub fn parse(expression: &str, timezone: Tz) -> Result<Self, ScheduleError> {
        let normalized = normalize_expression(expression);
        let schedule =
            Schedule::from_str(&normalized).map_err(|source| ScheduleError::InvalidCron {
                expression: expression.trim().to_string(),
                source,
            })?;

        let parsed = Self {
            expression: normalized,
            schedule,
            timezone,
        };
        if parsed.next_after(Utc::now()).is_none() {
            return Err(ScheduleError::NoUpcomingRun(parsed.expression));
        }
        Ok(parsed)
    }

    /// First fire time strictly after `after`, computed in this schedule's zone.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.timezone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }

    /// The normalized expression handed to the parser.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl fmt::Debug for JobSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSchedule")
            .field("expression", &self.expression)
            .field("timezone", &self.timezone.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn fire_days(expression: &str, from: &str, count: usize) -> Vec<String> {
        let schedule = JobSchedule::parse(expression, Tz::UTC).unwrap();
        let mut cursor = at(from);
        (0..count)
            .map(|_| {
                cursor = schedule.next_after(cursor).unwrap();
                cursor.format("%a %d").to_string()
            })
            .collect()
    }

    // ── normalize_expression ────────────────────────────────────────

    #[test]
    fn five_fields_gain_seconds() {
        assert_eq!(normalize_expression("  */15 * * * *  "), "0 */15 * * * *");
        assert_eq!(normalize_expression("0 */15 * * * *"), "0 */15 * * * *");
    }

    #[test]
    fn numeric_weekdays_shift_to_sunday_one() {
        assert_eq!(normalize_expression("0 2 * * 1-5"), "0 0 2 * * 2-6");
        assert_eq!(normalize_expression("0 2 * * 0,3"), "0 0 2 * * 1,4");
        assert_eq!(normalize_expression("0 2 * * 7"), "0 0 2 * * 1");
        assert_eq!(normalize_expression("0 0 2 * * 0 2030"), "0 0 2 * * 1 2030");
    }

    #[test]
    fn ranges_ending_on_seven_wrap_to_sunday() {
        assert_eq!(normalize_expression("0 2 * * 5-7"), "0 0 2 * * 6-7,1");
        assert_eq!(normalize_expression("0 2 * * 0-7"), "0 0 2 * * 1-7");
        assert_eq!(normalize_expression("0 2 * * 1-7/2"), "0 0 2 * * 2-7/2,1");
    }

    #[test]
    fn names_and_wildcards_pass_through() {
        assert_eq!(normalize_expression("0 2 * * MON-FRI"), "0 0 2 * * MON-FRI");
        assert_eq!(normalize_expression("0 2 * * */2"), "0 0 2 * * */2");
        assert_eq!(normalize_expression("0 0 2 * * SUN 2030"), "0 0 2 * * SUN 2030");
    }

    #[test]
    fn weekday_range_fires_monday_to_friday() {
        // 2026-10-17 is a Saturday.
        assert_eq!(
            fire_days("0 2 * * 1-5", "2026-10-17T12:00:00Z", 6),
            ["Mon 19", "Tue 20", "Wed 21", "Thu 22", "Fri 23", "Mon 26"]
        );
    }

    #[test]
    fn zero_and_seven_are_sunday() {
        assert_eq!(fire_days("0 2 * * 0", "2026-10-17T12:00:00Z", 2), ["Sun 18", "Sun 25"]);
        assert_eq!(fire_days("0 2 * * 7", "2026-10-17T12:00:00Z", 2), ["Sun 18", "Sun 25"]);
        assert_eq!(fire_days("0 2 * * SUN", "2026-10-17T12:00:00Z", 1), ["Sun 18"]);
    }

    // ── JobSchedule ─────────────────────────────────────────────────

    #[test]
    fn parse_valid_expression() {
        let schedule = JobSchedule::parse("*/1 * * * *", Tz::UTC).unwrap();
        assert_eq!(schedule.expression(), "0 */1 * * * *");
        assert_eq!(schedule.timezone(), Tz::UTC);
    }

    #[test]
    fn parse_invalid_expression() {
        let err = JobSchedule::parse("not a cron", Tz::UTC).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidCron { .. }), "{err}");
    }

    #[test]
    fn parse_expression_without_future_runs() {
        let err = JobSchedule::parse("0 0 0 1 1 * 2001", Tz::UTC).unwrap_err();
        assert!(matches!(err, ScheduleError::NoUpcomingRun(_)), "{err}");
    }

    #[test]
    fn next_after_is_strictly_later() {
        let schedule = JobSchedule::parse("0 * * * * *", Tz::UTC).unwrap();
        let tick = at("2026-01-15T10:00:00Z");
        assert_eq!(schedule.next_after(tick), Some(at("2026-01-15T10:01:00Z")));
    }

    #[test]
    fn next_after_respects_timezone() {
        // 02:00 in Amsterdam is 01:00 UTC in winter (CET) and 00:00 UTC in summer (CEST).
        let schedule = JobSchedule::parse("0 0 2 * * *", Tz::Europe__Amsterdam).unwrap();
        assert_eq!(
            schedule.next_after(at("2026-01-15T12:00:00Z")),
            Some(at("2026-01-16T01:00:00Z"))
        );
        assert_eq!(
            schedule.next_after(at("2026-07-15T12:00:00Z")),
            Some(at("2026-07-16T00:00:00Z"))
        );
    }

    #[test]
    fn same_expression_differs_per_zone() {
        let utc = JobSchedule::parse("0 0 9 * * *", Tz::UTC).unwrap();
        let tokyo = JobSchedule::parse("0 0 9 * * *", Tz::Asia__Tokyo).unwrap();
        let from = at("2026-03-01T12:00:00Z");
        assert_eq!(utc.next_after(from), Some(at("2026-03-02T09:00:00Z")));
        assert_eq!(tokyo.next_after(from), Some(at("2026-03-02T00:00:00Z")));
    }
}
