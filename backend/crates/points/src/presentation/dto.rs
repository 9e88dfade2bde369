//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use kernel::id::TransactionId;
use serde::{Deserialize, Serialize};

use crate::application::{LeaderboardPage, UserPosition};
use crate::domain::entities::{
    ItemRef, LedgerReceipt, LeaderboardEntry, Resident, Transaction, TransactionItem,
};
use crate::domain::value_objects::{LeaderboardType, Period, TransactionKind};

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRefRequest {
    pub id: i64,
}

/// Task completion request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub user_id: i64,
    pub tasks: Vec<TaskRefRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRefRequest {
    pub id: i64,
    pub quantity: i64,
}

/// Product redemption request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequest {
    pub user_id: i64,
    pub products: Vec<ProductRefRequest>,
}

/// Response for both completion and redemption
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceiptResponse {
    pub transaction_id: TransactionId,
    pub new_balance: i64,
    pub total_points: i64,
}

impl From<LedgerReceipt> for LedgerReceiptResponse {
    fn from(receipt: LedgerReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            new_balance: receipt.new_balance,
            total_points: receipt.total_points,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub unit_points: i64,
}

impl From<&TransactionItem> for TransactionItemResponse {
    fn from(item: &TransactionItem) -> Self {
        let (task_id, product_id) = match item.item {
            ItemRef::Task(id) => (Some(id.get()), None),
            ItemRef::Product(id) => (None, Some(id.get())),
        };
        Self {
            task_id,
            product_id,
            quantity: item.quantity,
            unit_points: item.unit_points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub points_delta: i64,
    pub actor_id: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TransactionItemResponse>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(t: &Transaction) -> Self {
        Self {
            transaction_id: t.transaction_id,
            user_id: t.user_id.get(),
            kind: t.kind,
            points_delta: t.points_delta,
            actor_id: t.actor_id.get(),
            created_at: t.created_at,
            items: t.items.iter().map(TransactionItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub transactions: Vec<TransactionResponse>,
    pub limit: usize,
    pub offset: usize,
}

// ============================================================================
// Residents
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: i64,
    pub user_name: String,
    pub batch_number: i32,
    pub current_points: i64,
    pub total_points: i64,
    pub is_archived: bool,
}

impl From<Resident> for BalanceResponse {
    fn from(r: Resident) -> Self {
        Self {
            user_id: r.user_id.get(),
            user_name: r.user_name,
            batch_number: r.batch_number,
            current_points: r.current_points,
            total_points: r.total_points,
            is_archived: r.is_archived,
        }
    }
}

/// Archive request; the configured threshold applies when omitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub months_threshold: Option<i64>,
}

// ============================================================================
// Leaderboard
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardParams {
    #[serde(rename = "type")]
    pub kind: Option<LeaderboardType>,
    pub period: Option<Period>,
    pub batch_number: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopPerformersParams {
    pub period: Option<Period>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionParams {
    #[serde(rename = "type")]
    pub kind: Option<LeaderboardType>,
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    pub rank: u32,
    pub user_id: i64,
    pub user_name: String,
    pub batch_number: i32,
    pub points: i64,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            user_id: e.user_id.get(),
            user_name: e.user_name,
            batch_number: e.batch_number,
            points: e.points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryResponse>,
    pub total_residents: usize,
    pub limit: usize,
    pub offset: usize,
}

impl From<LeaderboardPage> for LeaderboardResponse {
    fn from(page: LeaderboardPage) -> Self {
        Self {
            entries: page
                .entries
                .into_iter()
                .map(LeaderboardEntryResponse::from)
                .collect(),
            total_residents: page.total_residents,
            limit: page.page.limit(),
            offset: page.page.offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub rank: u32,
    pub points: i64,
    pub total_residents: usize,
}

impl From<UserPosition> for PositionResponse {
    fn from(p: UserPosition) -> Self {
        Self {
            rank: p.rank,
            points: p.points,
            total_residents: p.total_residents,
        }
    }
}
