//! Domain Entities

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ProductId, TaskId, TransactionId, UserId};
use serde::Serialize;

use crate::domain::services;
use crate::domain::value_objects::TransactionKind;
use crate::error::PointsResult;

/// Resident balance and activity data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resident {
    pub user_id: UserId,
    pub user_name: String,
    pub batch_number: i32,
    /// Spendable balance, never negative
    pub current_points: i64,
    /// Lifetime earned; redemptions never lower it
    pub total_points: i64,
    pub date_of_admission: NaiveDate,
    pub last_abscondence: Option<DateTime<Utc>>,
    pub is_archived: bool,
}

impl Resident {
    /// Fresh resident with an empty balance
    pub fn new(
        user_id: UserId,
        user_name: impl Into<String>,
        batch_number: i32,
        date_of_admission: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            batch_number,
            current_points: 0,
            total_points: 0,
            date_of_admission,
            last_abscondence: None,
            is_archived: false,
        }
    }

    pub fn balance(&self) -> Balance {
        Balance {
            current_points: self.current_points,
            total_points: self.total_points,
        }
    }

    pub fn apply(&mut self, balance: Balance) {
        self.current_points = balance.current_points;
        self.total_points = balance.total_points;
    }
}

/// Pair of counters mutated by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub current_points: i64,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: TaskId,
    pub task_name: String,
    pub category: String,
    pub points: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    /// Cost per unit
    pub points: i64,
    /// Units in stock
    pub quantity: i64,
    pub is_available: bool,
}

/// What a ledger line refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Task(TaskId),
    Product(ProductId),
}

/// One priced line of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionItem {
    pub item: ItemRef,
    pub quantity: i64,
    pub unit_points: i64,
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Positive for completions, negative for redemptions
    pub points_delta: i64,
    pub items: Vec<TransactionItem>,
    /// Staff member who recorded the entry
    pub actor_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Requested task with its occurrence count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLine {
    pub task_id: TaskId,
    pub quantity: i64,
}

/// Requested product with the number of units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Credit a resident for completed tasks
#[derive(Debug, Clone)]
pub struct CompletionCommand {
    pub user_id: UserId,
    pub actor_id: UserId,
    /// Aggregated, ascending by task id
    pub tasks: Vec<TaskLine>,
}

impl CompletionCommand {
    pub fn new(user_id: UserId, actor_id: UserId, task_ids: &[TaskId]) -> PointsResult<Self> {
        Ok(Self {
            user_id,
            actor_id,
            tasks: services::aggregate_tasks(task_ids)?,
        })
    }
}

/// Debit a resident for redeemed products
#[derive(Debug, Clone)]
pub struct RedemptionCommand {
    pub user_id: UserId,
    pub actor_id: UserId,
    /// Aggregated, ascending by product id
    pub products: Vec<ProductLine>,
}

impl RedemptionCommand {
    pub fn new(user_id: UserId, actor_id: UserId, lines: &[ProductLine]) -> PointsResult<Self> {
        Ok(Self {
            user_id,
            actor_id,
            products: services::aggregate_products(lines)?,
        })
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|l| l.product_id).collect()
    }
}

/// Result of a committed ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    pub transaction_id: TransactionId,
    pub new_balance: i64,
    pub total_points: i64,
}

/// Unranked leaderboard row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub user_id: UserId,
    pub user_name: String,
    pub batch_number: i32,
    pub points: i64,
}

/// Ranked leaderboard row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub user_name: String,
    pub batch_number: i32,
    pub points: i64,
}

/// Activity timestamps consulted by the archive sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentActivity {
    pub user_id: UserId,
    pub date_of_admission: NaiveDate,
    pub last_transaction_at: Option<DateTime<Utc>>,
    pub last_abscondence: Option<DateTime<Utc>>,
}

/// A resident the sweep could not archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveFailure {
    pub user_id: UserId,
    pub message: String,
}

/// Outcome of one archive sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub archived: usize,
    pub errors: Vec<ArchiveFailure>,
}
