//! Turns configured window definitions into scheduled, exported windows.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::CoreConfig;
use crate::controller::WindowController;
use crate::error::WindowError;
use crate::exporter::SignalExporter;
use crate::report::next_run_line;
use crate::scheduler::{JobHandle, JobSchedule, Scheduler};
use crate::signal::SignalState;
use crate::window::{WindowDefinition, WindowDescriptor};

/// A window that made it through validation: descriptor, live signal and
/// the job that drives it.
#[derive(Clone)]
pub struct MaintenanceWindow {
    controller: Arc<WindowController>,
    job: JobHandle,
}

impl MaintenanceWindow {
    /// Validate `definition`, register its gauge and schedule its controller.
    ///
    /// The gauge is only registered once the cron expression parsed, so a
    /// rejected window never shows up in the exposition.
    pub fn build(
        definition: &WindowDefinition,
        config: &CoreConfig,
        scheduler: &mut Scheduler,
        exporter: &SignalExporter,
    ) -> Result<Self, WindowError> {
        let descriptor = WindowDescriptor::from_definition(definition, config)?;
        let schedule = JobSchedule::parse(descriptor.cron_expression(), descriptor.timezone())
            .map_err(|source| WindowError::Schedule {
                window: descriptor.name().to_string(),
                source,
            })?;

        let signal = exporter.register(descriptor.labels());
        let controller = Arc::new(WindowController::new(Arc::new(descriptor), signal, config));

        let job = scheduler
            .register(schedule, controller.clone())
            .map_err(|source| WindowError::Schedule {
                window: controller.descriptor().name().to_string(),
                source,
            })?;

        Ok(Self { controller, job })
    }

    pub fn descriptor(&self) -> &WindowDescriptor {
        self.controller.descriptor()
    }

    pub fn signal(&self) -> &SignalState {
        self.controller.signal()
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn controller(&self) -> &Arc<WindowController> {
        &self.controller
    }
}

impl std::fmt::Debug for MaintenanceWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceWindow")
            .field("descriptor", self.descriptor())
            .field("signal", self.signal())
            .field("job", &self.job)
            .finish()
    }
}

/// All windows accepted at startup, in configuration order.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: Vec<MaintenanceWindow>,
}

impl WindowRegistry {
    /// Build every definition.
    ///
    /// Windows with a bad name, duration or cron expression are logged and
    /// dropped. A fatal error (see [`WindowError::is_fatal`]) aborts loading.
    ///
    /// Two windows with the same name and labels are both scheduled but
    /// export through one `maintenance_active` series.
    pub fn load(
        definitions: &[WindowDefinition],
        config: &CoreConfig,
        scheduler: &mut Scheduler,
        exporter: &SignalExporter,
    ) -> Result<Self, WindowError> {
        let mut windows = Vec::with_capacity(definitions.len());

        for definition in definitions {
            match MaintenanceWindow::build(definition, config, scheduler, exporter) {
                Ok(window) => {
                    info!("Loaded: {}", window.descriptor());
                    windows.push(window);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(window = %definition.name, error = %e, "skipping maintenance window");
                }
            }
        }

        Ok(Self { windows })
    }

    pub fn windows(&self) -> &[MaintenanceWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// First window with the given name.
    pub fn get(&self, name: &str) -> Option<&MaintenanceWindow> {
        self.windows.iter().find(|w| w.descriptor().name() == name)
    }

    /// One `"name" Nextrun: ...` line per window.
    ///
    /// A window whose next run cannot be determined is a fatal error.
    pub fn next_run_report(&self, config: &CoreConfig) -> Result<Vec<String>, WindowError> {
        self.windows
            .iter()
            .map(|window| {
                let descriptor = window.descriptor();
                let next_run = window.job.next_run().map_err(|source| WindowError::NextRun {
                    window: descriptor.name().to_string(),
                    source,
                })?;
                Ok(next_run_line(
                    descriptor.name(),
                    next_run,
                    config.timezone,
                    descriptor.timezone(),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::*;

    fn def(name: &str, duration: &str, cron: &str, tz: Option<&str>) -> WindowDefinition {
        WindowDefinition {
            name: name.into(),
            duration: duration.into(),
            cron: cron.into(),
            timezone: tz.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn loads_valid_windows() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let defs = vec![
            def("a", "10s", "*/1 * * * *", None),
            def("b", "1h", "0 2 * * *", Some("Europe/Amsterdam")),
        ];

        let registry =
            WindowRegistry::load(&defs, &CoreConfig::default(), &mut scheduler, &exporter).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(scheduler.len(), 2);
        assert_eq!(registry.get("b").unwrap().descriptor().timezone(), Tz::Europe__Amsterdam);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn bad_duration_drops_only_that_window() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let defs = vec![
            def("broken", "abc", "*/1 * * * *", None),
            def("good", "10s", "*/1 * * * *", None),
        ];

        let registry =
            WindowRegistry::load(&defs, &CoreConfig::default(), &mut scheduler, &exporter).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.windows()[0].descriptor().name(), "good");

        let text = exporter.render();
        assert!(!text.contains("broken"), "{text}");
        assert!(text.contains(r#"name="good""#), "{text}");
    }

    #[test]
    fn bad_cron_drops_window_without_gauge() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let defs = vec![def("nocron", "10s", "not a cron", None)];

        let registry =
            WindowRegistry::load(&defs, &CoreConfig::default(), &mut scheduler, &exporter).unwrap();
        assert!(registry.is_empty());
        assert!(scheduler.is_empty());
        assert!(!exporter.render().contains("nocron"));
    }

    #[test]
    fn bad_timezone_aborts_load() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let defs = vec![
            def("good", "10s", "*/1 * * * *", None),
            def("w", "10s", "*/1 * * * *", Some("Invalid/Zone")),
        ];

        let err = WindowRegistry::load(&defs, &CoreConfig::default(), &mut scheduler, &exporter)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn report_has_one_line_per_window() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let defs = vec![
            def("utc", "10s", "0 2 * * *", None),
            def("ams", "10s", "0 2 * * *", Some("Europe/Amsterdam")),
        ];
        let config = CoreConfig::default();

        let registry = WindowRegistry::load(&defs, &config, &mut scheduler, &exporter).unwrap();
        let lines = registry.next_run_report(&config).unwrap();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#""utc" Nextrun: "#), "{}", lines[0]);
        assert!(lines[0].ends_with("(UTC)"), "{}", lines[0]);
        assert!(lines[1].ends_with("(Europe/Amsterdam)"), "{}", lines[1]);
        assert!(lines[1].contains(" 02:00:00(Europe/Amsterdam)"), "{}", lines[1]);
    }

    #[tokio::test]
    async fn register_after_start_is_a_window_error() {
        let mut scheduler = Scheduler::new();
        let exporter = SignalExporter::new();
        let (_tx, rx) = tokio::sync::watch::channel(false);
        scheduler.start(rx).unwrap();

        let err = MaintenanceWindow::build(
            &def("late", "10s", "*/1 * * * *", None),
            &CoreConfig::default(),
            &mut scheduler,
            &exporter,
        )
        .unwrap_err();
        assert!(matches!(err, WindowError::Schedule { .. }));
        assert!(!err.is_fatal());
    }
}
