//! Handle to a registered recurring job.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ScheduleError;

use super::cron::JobSchedule;

/// Shared reference to one registered job.
///
/// Cloning is cheap; every clone observes the same next-run time, which the
/// scheduler clock advances each time the job fires.
#[derive(Clone)]
pub struct JobHandle {
    inner: Arc<JobState>,
}

struct JobState {
    id: Uuid,
    name: String,
    schedule: JobSchedule,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

impl JobHandle {
    pub(crate) fn new(name: &str, schedule: JobSchedule) -> Result<Self, ScheduleError> {
        let next_run = schedule
            .next_after(Utc::now())
            .ok_or_else(|| ScheduleError::NoUpcomingRun(schedule.expression().to_string()))?;
        Ok(Self {
            inner: Arc::new(JobState {
                id: Uuid::new_v4(),
                name: name.to_string(),
                schedule,
                next_run: RwLock::new(Some(next_run)),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn schedule(&self) -> &JobSchedule {
        &self.inner.schedule
    }

    /// Time of the next trigger.
    pub fn next_run(&self) -> Result<DateTime<Utc>, ScheduleError> {
        self.planned()
            .ok_or_else(|| ScheduleError::NoUpcomingRun(self.inner.schedule.expression().to_string()))
    }

    pub(crate) fn planned(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .next_run
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the next run past `now`. Returns the new next run, if any.
    pub(crate) fn advance(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = self.inner.schedule.next_after(now);
        *self
            .inner
            .next_run
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
        next
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("schedule", &self.inner.schedule)
            .field("next_run", &self.planned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::*;

    fn every_minute() -> JobSchedule {
        JobSchedule::parse("0 * * * * *", Tz::UTC).unwrap()
    }

    #[test]
    fn new_job_has_future_next_run() {
        let job = JobHandle::new("w", every_minute()).unwrap();
        assert!(job.next_run().unwrap() > Utc::now());
        assert_eq!(job.name(), "w");
    }

    #[test]
    fn ids_are_unique() {
        let a = JobHandle::new("w", every_minute()).unwrap();
        let b = JobHandle::new("w", every_minute()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn advance_is_shared_between_clones() {
        let job = JobHandle::new("w", every_minute()).unwrap();
        let clone = job.clone();
        let now = DateTime::parse_from_rfc3339("2030-05-01T08:30:10Z")
            .unwrap()
            .with_timezone(&Utc);

        let next = job.advance(now).unwrap();
        assert_eq!(next.to_rfc3339(), "2030-05-01T08:31:00+00:00");
        assert_eq!(clone.next_run().unwrap(), next);
    }

    #[test]
    fn next_run_is_stable_between_advances() {
        let job = JobHandle::new("w", every_minute()).unwrap();
        assert_eq!(job.next_run().unwrap(), job.next_run().unwrap());
    }
}
