//! Window definitions as configured and the descriptors built from them.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::duration::parse_duration;
use crate::error::WindowError;

/// Reserved label carrying the window name.
pub const NAME_LABEL: &str = "name";
/// Reserved label carrying the resolved timezone.
pub const TIMEZONE_LABEL: &str = "configured_timezone";

/// One maintenance window as decoded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDefinition {
    pub name: String,
    /// Duration string, e.g. `"30m"`.
    pub duration: String,
    pub cron: String,
    /// IANA zone the cron expression is evaluated in; blank means the
    /// process default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Immutable, validated representation of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDescriptor {
    name: String,
    labels: BTreeMap<String, String>,
    cron_expression: String,
    duration: Duration,
    timezone: Tz,
}

impl WindowDescriptor {
    /// Validate a definition.
    ///
    /// The timezone is resolved first; its failure is the one error here
    /// that [`WindowError::is_fatal`] reports as fatal.
    pub fn from_definition(
        definition: &WindowDefinition,
        config: &CoreConfig,
    ) -> Result<Self, WindowError> {
        let timezone = config.window_timezone(definition.timezone.as_deref())?;

        let name = definition.name.trim();
        if name.is_empty() {
            return Err(WindowError::MissingName);
        }

        let duration =
            parse_duration(&definition.duration).map_err(|source| WindowError::InvalidDuration {
                window: name.to_string(),
                value: definition.duration.clone(),
                source,
            })?;

        let mut labels = definition.labels.clone();
        labels.insert(NAME_LABEL.to_string(), name.to_string());
        labels.insert(TIMEZONE_LABEL.to_string(), timezone.name().to_string());

        Ok(Self {
            name: name.to_string(),
            labels,
            cron_expression: definition.cron.trim().to_string(),
            duration,
            timezone,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full label set, including the reserved `name` and
    /// `configured_timezone` labels.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expression
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// `"name"(cron) - {key:"value",...}`
impl fmt::Display for WindowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"({}) - {{", self.name, self.cron_expression)?;
        for (i, (key, value)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:\"{}\"", key, value)?;
        }
        f.write_str("}")
    }
}
