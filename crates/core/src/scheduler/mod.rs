//! Cron job scheduler running on the tokio runtime.
//!
//! Jobs are registered up front, each pairing a [`JobSchedule`] with a
//! [`ScheduledTask`]. [`Scheduler::start`] spawns a single clock loop that
//! sleeps until the earliest planned run and fires every due job on its own
//! task, so jobs never wait on one another.
//!
//! Split into focused submodules:
//! - `cron`: expression normalization and fire time computation
//! - `job`: the shared [`JobHandle`]
//! - `task`: the [`ScheduledTask`] trait and its context
//! - `clock`: the clock loop

mod clock;
pub(crate) mod cron;
mod job;
mod task;


use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ScheduleError;

pub use self::cron::JobSchedule;
pub use self::job::JobHandle;
pub use self::task::{ScheduledTask, TaskContext};

#[derive(Clone)]
pub(crate) struct Job {
    pub(crate) handle: JobHandle,
    pub(crate) task: Arc<dyn ScheduledTask>,
}

/// Registry of cron jobs plus the clock that fires them.
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<Job>,
    started: bool,
}

impl Scheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recurring job. Only allowed before [`start`](Self::start).
    pub fn register(
        &mut self,
        schedule: JobSchedule,
        task: Arc<dyn ScheduledTask>,
    ) -> Result<JobHandle, ScheduleError> {
        if self.started {
            return Err(ScheduleError::AlreadyStarted);
        }

        let handle = JobHandle::new(task.name(), schedule)?;
        debug!(
            job = %handle.name(),
            id = %handle.id(),
            cron = %handle.schedule().expression(),
            next_run = ?handle.next_run().ok(),
            "registered job"
        );
        self.jobs.push(Job {
            handle: handle.clone(),
            task,
        });
        Ok(handle)
    }

    /// Spawn the clock loop. It runs until `shutdown` flips to `true`.
    ///
    /// Activations already in flight observe the same signal; there is no
    /// drain, they are abandoned.
    pub fn start(
        &mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, ScheduleError> {
        if self.started {
            return Err(ScheduleError::AlreadyStarted);
        }
        self.started = true;

        let jobs = self.jobs.clone();
        Ok(tokio::spawn(clock::run(jobs, shutdown)))
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Handles of every registered job, in registration order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobHandle> {
        self.jobs.iter().map(|job| &job.handle)
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job has been registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
