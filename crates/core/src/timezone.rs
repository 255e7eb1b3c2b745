//! IANA timezone resolution.

use chrono_tz::Tz;

use crate::error::TimezoneError;

/// Resolve an IANA timezone name such as `"Europe/Amsterdam"`.
pub fn resolve_timezone(name: &str) -> Result<Tz, TimezoneError> {
    let trimmed = name.trim();
    trimmed.parse::<Tz>().map_err(|e| TimezoneError {
        name: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve an optional per-window timezone, falling back to `default` when
/// the name is absent or blank.
pub fn resolve_or_default(name: Option<&str>, default: Tz) -> Result<Tz, TimezoneError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => resolve_timezone(name),
        None => Ok(default),
    }
}
