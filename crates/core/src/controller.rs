//! The per-window state machine run on every cron firing.
//!
//! One activation goes Inactive -> Active, sleeps for the window duration,
//! then goes back to Inactive. A per-window lock keeps activations of the
//! same window from overlapping: if the cron expression fires again before
//! the previous activation closed (duration longer than the cron interval),
//! the new firing is skipped with a warning instead of racing the close.
//!
//! With a zero duration the signal is set and cleared back to back; a
//! scrape may or may not observe the `1`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::CoreConfig;
use crate::report::format_time;
use crate::scheduler::{ScheduledTask, TaskContext};
use crate::signal::SignalState;
use crate::window::WindowDescriptor;

/// How one activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Opened, waited the full duration, closed.
    Completed,
    /// Another activation of the same window was still open.
    Skipped,
    /// Shutdown arrived while the window was open.
    Abandoned,
}

/// Drives one window's [`SignalState`].
pub struct WindowController {
    descriptor: Arc<WindowDescriptor>,
    signal: SignalState,
    display_timezone: Tz,
    in_flight: Mutex<()>,
}

impl WindowController {
    pub fn new(descriptor: Arc<WindowDescriptor>, signal: SignalState, config: &CoreConfig) -> Self {
        Self {
            descriptor,
            signal,
            display_timezone: config.timezone,
            in_flight: Mutex::new(()),
        }
    }

    pub fn descriptor(&self) -> &WindowDescriptor {
        &self.descriptor
    }

    pub fn signal(&self) -> &SignalState {
        &self.signal
    }

    /// Run one open -> wait -> close cycle.
    pub async fn activate(&self, mut ctx: TaskContext) -> Activation {
        let name = self.descriptor.name();

        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!(
                window = %name,
                duration = ?self.descriptor.duration(),
                "Maintenance Window \"{}\" fired while still open, skipping this run", name
            );
            return Activation::Skipped;
        };

        let duration = self.descriptor.duration();
        let end_time = Utc::now()
            + chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        info!(
            window = %name,
            "Maintenance Window Open: \"{}\", Closing at: {}",
            name,
            format_time(end_time, self.display_timezone)
        );
        self.signal.set_active();

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = ctx.shutdown_requested() => {
                info!(window = %name, "shutdown while \"{}\" is open, abandoning activation", name);
                return Activation::Abandoned;
            }
        }

        match ctx.job.next_run() {
            Ok(next_run) => info!(
                window = %name,
                "Maintenance Window Closed: \"{}\" Next run: {}",
                name,
                format_time(next_run, self.display_timezone)
            ),
            Err(e) => {
                error!(window = %name, error = %e, "could not retrieve next run time");
                info!(window = %name, "Maintenance Window Closed: \"{}\"", name);
            }
        }
        self.signal.set_inactive();

        Activation::Completed
    }
}

#[async_trait]
impl ScheduledTask for WindowController {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    async fn run(&self, ctx: TaskContext) {
        self.activate(ctx).await;
    }
}
