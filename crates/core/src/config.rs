use chrono_tz::Tz;

use crate::error::TimezoneError;
use crate::timezone::{resolve_or_default, resolve_timezone};

/// Process-wide settings shared by every window.
///
/// Built once at startup and passed by reference into window construction
/// and the controllers; nothing in the engine reads ambient globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    /// Default zone for windows without their own, and the zone diagnostic
    /// timestamps are rendered in.
    pub timezone: Tz,
}

impl CoreConfig {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Build the config from the configured timezone name.
    pub fn from_timezone_name(name: &str) -> Result<Self, TimezoneError> {
        Ok(Self::new(resolve_timezone(name)?))
    }

    /// Resolve a window's own timezone, defaulting to the process zone.
    pub fn window_timezone(&self, name: Option<&str>) -> Result<Tz, TimezoneError> {
        resolve_or_default(name, self.timezone)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
