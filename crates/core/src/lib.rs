//! Cron-driven maintenance window engine.
//!
//! This crate provides:
//! - Window definitions and their validation (duration, timezone, labels)
//! - A tokio cron scheduler evaluating each window in its own timezone
//! - Per-window controllers toggling an active/inactive signal
//! - Prometheus exposition of every signal as `maintenance_active`

pub mod config;
pub mod controller;
pub mod duration;
pub mod error;
pub mod exporter;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod signal;
pub mod timezone;
pub mod window;

pub use config::CoreConfig;
pub use controller::{Activation, WindowController};
pub use duration::parse_duration;
pub use error::*;
pub use exporter::{SignalExporter, SIGNAL_METRIC};
pub use registry::{MaintenanceWindow, WindowRegistry};
pub use scheduler::{JobHandle, JobSchedule, ScheduledTask, Scheduler, TaskContext};
pub use signal::SignalState;
pub use window::{WindowDefinition, WindowDescriptor};
