use thiserror::Error;

use crate::duration::DurationError;

/// A timezone name that is not in the IANA database.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timezone \"{name}\": {reason}")]
pub struct TimezoneError {
    pub name: String,
    pub reason: String,
}

/// Errors raised while registering or querying scheduled jobs.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid cron expression \"{expression}\": {source}")]
    InvalidCron {
        expression: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("cron expression \"{0}\" has no upcoming run")]
    NoUpcomingRun(String),

    #[error("scheduler already started")]
    AlreadyStarted,
}

/// Errors raised while turning a window definition into a scheduled window.
///
/// Use [`WindowError::is_fatal`] to decide between aborting startup and
/// dropping the single window.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error(transparent)]
    Timezone(#[from] TimezoneError),

    #[error("window has an empty name")]
    MissingName,

    #[error("window \"{window}\": invalid duration \"{value}\": {source}")]
    InvalidDuration {
        window: String,
        value: String,
        #[source]
        source: DurationError,
    },

    #[error("window \"{window}\": {source}")]
    Schedule {
        window: String,
        #[source]
        source: ScheduleError,
    },

    #[error("window \"{window}\": could not obtain next run time: {source}")]
    NextRun {
        window: String,
        #[source]
        source: ScheduleError,
    },
}

impl WindowError {
    /// Fatal errors mean the process cannot run correctly at all; the rest
    /// only cost the offending window.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WindowError::Timezone(_) | WindowError::NextRun { .. })
    }
}
