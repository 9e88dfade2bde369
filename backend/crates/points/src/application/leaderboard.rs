//! Leaderboard Use Cases
//!
//! Ranks are computed over the whole filtered set, then paginated, so a
//! resident keeps the same rank on every page.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entities::LeaderboardEntry;
use crate::domain::repository::LeaderboardRepository;
use crate::domain::services::dense_rank;
use crate::domain::value_objects::{LeaderboardType, Page, Period, ScoreSource};
use crate::error::{PointsError, PointsResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderboardQuery {
    pub kind: LeaderboardType,
    pub period: Period,
    pub batch_number: Option<i32>,
    pub page: Page,
}

/// One page of the leaderboard
#[derive(Debug, Clone)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// Size of the ranked set before pagination
    pub total_residents: usize,
    pub page: Page,
}

/// A resident's standing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPosition {
    pub rank: u32,
    pub points: i64,
    pub total_residents: usize,
}

async fn ranked<R>(
    repo: &R,
    kind: LeaderboardType,
    period: Period,
    batch_number: Option<i32>,
    now: DateTime<Utc>,
) -> PointsResult<Vec<LeaderboardEntry>>
where
    R: LeaderboardRepository,
{
    let source = ScoreSource::resolve(kind, period, now);
    let rows = repo.scores(source, batch_number).await?;
    Ok(dense_rank(rows))
}

fn paginate(entries: Vec<LeaderboardEntry>, page: Page) -> LeaderboardPage {
    let total_residents = entries.len();
    LeaderboardPage {
        entries: entries
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect(),
        total_residents,
        page,
    }
}

/// Get Leaderboard Use Case
pub struct GetLeaderboardUseCase<R>
where
    R: LeaderboardRepository,
{
    repo: Arc<R>,
}

impl<R> GetLeaderboardUseCase<R>
where
    R: LeaderboardRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, query: LeaderboardQuery) -> PointsResult<LeaderboardPage> {
        self.execute_at(query, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        query: LeaderboardQuery,
        now: DateTime<Utc>,
    ) -> PointsResult<LeaderboardPage> {
        let entries = ranked(
            self.repo.as_ref(),
            query.kind,
            query.period,
            query.batch_number,
            now,
        )
        .await?;
        Ok(paginate(entries, query.page))
    }
}

/// Top Performers Use Case
///
/// 累計ポイント（期間指定可）の上位。バッチ絞り込みなし、offset は常に 0。
pub struct TopPerformersUseCase<R>
where
    R: LeaderboardRepository,
{
    repo: Arc<R>,
}

impl<R> TopPerformersUseCase<R>
where
    R: LeaderboardRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, period: Period, limit: Option<i64>) -> PointsResult<LeaderboardPage> {
        let page = Page::new(limit, Some(0))?;
        let entries = ranked(
            self.repo.as_ref(),
            LeaderboardType::Total,
            period,
            None,
            Utc::now(),
        )
        .await?;
        Ok(paginate(entries, page))
    }
}

/// User Position Use Case
pub struct UserPositionUseCase<R>
where
    R: LeaderboardRepository,
{
    repo: Arc<R>,
}

impl<R> UserPositionUseCase<R>
where
    R: LeaderboardRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        kind: LeaderboardType,
        period: Period,
    ) -> PointsResult<UserPosition> {
        let entries = ranked(self.repo.as_ref(), kind, period, None, Utc::now()).await?;
        let total_residents = entries.len();

        entries
            .into_iter()
            .find(|e| e.user_id == user_id)
            .map(|e| UserPosition {
                rank: e.rank,
                points: e.points,
                total_residents,
            })
            .ok_or(PointsError::PositionNotFound(user_id))
    }
}
