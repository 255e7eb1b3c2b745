use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};

use super::task::{wait_for_shutdown, TaskContext};
use super::Job;

/// The global clock loop. Sleeps until the earliest planned run, fires every
/// due job on its own task, and repeats until shutdown.
pub(super) async fn run(jobs: Vec<Job>, mut shutdown: watch::Receiver<bool>) {
    info!(jobs = jobs.len(), "scheduler clock started");

    loop {
        let now = Utc::now();
        for job in &jobs {
            match job.handle.planned() {
                Some(at) if at <= now => {
                    let next = job.handle.advance(now);
                    debug!(
                        job = %job.handle.name(),
                        id = %job.handle.id(),
                        scheduled_for = %at,
                        next_run = ?next,
                        "firing job"
                    );
                    fire(job, &shutdown);
                }
                _ => {}
            }
        }

        let Some(wake_at) = jobs.iter().filter_map(|job| job.handle.planned()).min() else {
            info!("no job has an upcoming run, clock idle until shutdown");
            wait_for_shutdown(&mut shutdown).await;
            break;
        };

        let delay = (wake_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_for_shutdown(&mut shutdown) => break,
        }
    }

    info!("scheduler clock stopped");
}

fn fire(job: &Job, shutdown: &watch::Receiver<bool>) {
    let task = Arc::clone(&job.task);
    let ctx = TaskContext::new(job.handle.clone(), shutdown.clone());
    tokio::spawn(async move {
        task.run(ctx).await;
    });
}
