//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entities::{
    CompletionCommand, LedgerReceipt, RedemptionCommand, Resident, ResidentActivity, ScoreRow,
    Transaction,
};
use crate::domain::value_objects::{Page, ScoreSource};
use crate::error::PointsResult;

/// Ledger repository trait
///
/// `complete_tasks` and `redeem_products` are atomic: the balance check, the
/// balance update and the transaction insert either all happen or none do.
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    async fn find_resident(&self, user_id: UserId) -> PointsResult<Option<Resident>>;

    /// Credit the resident for the referenced tasks
    async fn complete_tasks(&self, command: &CompletionCommand) -> PointsResult<LedgerReceipt>;

    /// Debit the resident and take the products out of stock
    async fn redeem_products(&self, command: &RedemptionCommand) -> PointsResult<LedgerReceipt>;

    /// Transactions of one resident, newest first
    async fn history(&self, user_id: UserId, page: Page) -> PointsResult<Vec<Transaction>>;
}

/// Leaderboard read model
#[trait_variant::make(LeaderboardRepository: Send)]
pub trait LocalLeaderboardRepository {
    /// Points of every non-archived resident, optionally for one batch
    async fn scores(
        &self,
        source: ScoreSource,
        batch_number: Option<i32>,
    ) -> PointsResult<Vec<ScoreRow>>;
}

/// Archive sweep storage
#[trait_variant::make(ArchiveRepository: Send)]
pub trait LocalArchiveRepository {
    /// Activity timestamps of every non-archived resident
    async fn activity(&self) -> PointsResult<Vec<ResidentActivity>>;

    /// Flag the resident as archived if their last activity is still before
    /// `cutoff`, checked under the same lock ledger writes take.
    /// `false` if already archived or active again.
    async fn archive_resident(&self, user_id: UserId, cutoff: DateTime<Utc>) -> PointsResult<bool>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait PointsRepository:
    LedgerRepository + LeaderboardRepository + ArchiveRepository + Clone + Send + Sync + 'static
{
}

impl<T> PointsRepository for T where
    T: LedgerRepository + LeaderboardRepository + ArchiveRepository + Clone + Send + Sync + 'static
{
}
