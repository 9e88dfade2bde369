//! Archive Job
//!
//! Flags residents with no activity for the configured number of months.
//! A failure on one resident is recorded in the report and the sweep moves
//! on. Each candidate is re-checked against the cutoff when it is flagged,
//! so a resident who transacts mid-sweep stays active. Runs never overlap:
//! a second request while one is in flight gets `Conflict`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::entities::{ArchiveFailure, ArchiveReport};
use crate::domain::repository::ArchiveRepository;
use crate::domain::services::{archive_cutoff, is_inactive};
use crate::domain::value_objects::MonthsThreshold;
use crate::error::{PointsError, PointsResult};

pub struct ArchiveJob<R>
where
    R: ArchiveRepository,
{
    repo: Arc<R>,
    guard: Arc<Mutex<()>>,
}

impl<R> Clone for ArchiveJob<R>
where
    R: ArchiveRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<R> ArchiveJob<R>
where
    R: ArchiveRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Archive residents inactive for at least `months_threshold` months
    pub async fn archive_inactive_residents(
        &self,
        months_threshold: i64,
    ) -> PointsResult<ArchiveReport> {
        self.run_at(months_threshold, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        months_threshold: i64,
        now: DateTime<Utc>,
    ) -> PointsResult<ArchiveReport> {
        let months = MonthsThreshold::new(months_threshold)?;
        let _running = self
            .guard
            .try_lock()
            .map_err(|_| PointsError::Conflict("Archive run already in progress".to_string()))?;

        let cutoff = archive_cutoff(now, months)?;
        let candidates: Vec<_> = self
            .repo
            .activity()
            .await?
            .into_iter()
            .filter(|a| is_inactive(a, cutoff))
            .collect();

        let mut report = ArchiveReport::default();
        for activity in candidates {
            match self.repo.archive_resident(activity.user_id, cutoff).await {
                Ok(true) => report.archived += 1,
                Ok(false) => {
                    tracing::debug!(
                        user_id = %activity.user_id,
                        "Resident archived or active since the activity scan, skipped"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %activity.user_id,
                        error = %e,
                        "Failed to archive resident"
                    );
                    report.errors.push(ArchiveFailure {
                        user_id: activity.user_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            months = months.get(),
            %cutoff,
            archived = report.archived,
            failed = report.errors.len(),
            "Archive sweep finished"
        );

        Ok(report)
    }
}

impl<R> ArchiveJob<R>
where
    R: ArchiveRepository + Send + Sync + 'static,
{
    /// Run the sweep every `period`; ticks that land on a running sweep are skipped
    pub fn spawn_scheduler(self, period: Duration, months_threshold: u32) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match self.archive_inactive_residents(months_threshold.into()).await {
                    Ok(_) => {}
                    Err(PointsError::Conflict(_)) => {
                        tracing::debug!("Archive sweep still running, tick skipped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Archive sweep failed");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryPointsRepository;

    #[tokio::test]
    async fn test_overlapping_run_is_conflict() {
        let job = ArchiveJob::new(Arc::new(InMemoryPointsRepository::new()));

        let held = job.guard.clone();
        let _running = held.lock().await;

        let err = job.archive_inactive_residents(6).await.unwrap_err();
        assert!(matches!(err, PointsError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_threshold_must_be_positive() {
        let job = ArchiveJob::new(Arc::new(InMemoryPointsRepository::new()));

        assert!(matches!(
            job.archive_inactive_residents(0).await,
            Err(PointsError::Validation(_))
        ));
        assert_eq!(
            job.archive_inactive_residents(1).await.unwrap(),
            ArchiveReport::default()
        );
    }
}
