//! In-memory points repository
//!
//! Each resident sits behind its own async mutex, held for the whole
//! check-and-update, so operations on different residents never contend.
//! Product stock is guarded by the catalog lock, always taken after the
//! resident lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{ProductId, TaskId, TransactionId, UserId};
use tokio::sync::{Mutex, RwLock};

use crate::domain::entities::{
    CompletionCommand, LedgerReceipt, Product, RedemptionCommand, Resident, ResidentActivity,
    ScoreRow, Task, Transaction,
};
use crate::domain::repository::{ArchiveRepository, LeaderboardRepository, LedgerRepository};
use crate::domain::services::{
    credit, debit, ensure_can_transact, is_inactive, price_completion, price_redemption,
};
use crate::domain::value_objects::{Page, ScoreSource, TransactionKind};
use crate::error::{PointsError, PointsResult};

#[derive(Default)]
struct Catalog {
    tasks: BTreeMap<TaskId, Task>,
    products: BTreeMap<ProductId, Product>,
}

#[derive(Default)]
struct Inner {
    residents: RwLock<BTreeMap<UserId, Arc<Mutex<Resident>>>>,
    catalog: RwLock<Catalog>,
    transactions: RwLock<Vec<Transaction>>,
}

#[derive(Clone, Default)]
pub struct InMemoryPointsRepository {
    inner: Arc<Inner>,
}

impl InMemoryPointsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_resident(&self, resident: Resident) {
        self.inner
            .residents
            .write()
            .await
            .insert(resident.user_id, Arc::new(Mutex::new(resident)));
    }

    pub async fn insert_task(&self, task: Task) {
        self.inner.catalog.write().await.tasks.insert(task.task_id, task);
    }

    pub async fn insert_product(&self, product: Product) {
        self.inner
            .catalog
            .write()
            .await
            .products
            .insert(product.product_id, product);
    }

    /// Import a ledger entry as-is (historical data); balances are untouched
    pub async fn import_transaction(&self, transaction: Transaction) {
        self.inner.transactions.write().await.push(transaction);
    }

    pub async fn product(&self, product_id: ProductId) -> Option<Product> {
        self.inner.catalog.read().await.products.get(&product_id).cloned()
    }

    async fn resident_cell(&self, user_id: UserId) -> PointsResult<Arc<Mutex<Resident>>> {
        self.inner
            .residents
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(PointsError::ResidentNotFound(user_id))
    }

    async fn snapshot(&self) -> Vec<Resident> {
        let cells: Vec<_> = self.inner.residents.read().await.values().cloned().collect();
        let mut residents = Vec::with_capacity(cells.len());
        for cell in cells {
            residents.push(cell.lock().await.clone());
        }
        residents
    }
}

fn activity_of(resident: &Resident, transactions: &[Transaction]) -> ResidentActivity {
    ResidentActivity {
        user_id: resident.user_id,
        date_of_admission: resident.date_of_admission,
        last_transaction_at: transactions
            .iter()
            .filter(|t| t.user_id == resident.user_id)
            .map(|t| t.created_at)
            .max(),
        last_abscondence: resident.last_abscondence,
    }
}

impl LedgerRepository for InMemoryPointsRepository {
    async fn find_resident(&self, user_id: UserId) -> PointsResult<Option<Resident>> {
        let cell = self.inner.residents.read().await.get(&user_id).cloned();
        match cell {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn complete_tasks(&self, command: &CompletionCommand) -> PointsResult<LedgerReceipt> {
        let cell = self.resident_cell(command.user_id).await?;
        let mut resident = cell.lock().await;
        ensure_can_transact(&resident)?;

        let priced = {
            let catalog = self.inner.catalog.read().await;
            let tasks: Vec<Task> = command
                .tasks
                .iter()
                .filter_map(|line| catalog.tasks.get(&line.task_id).cloned())
                .collect();
            price_completion(&command.tasks, &tasks)?
        };
        let balance = credit(resident.balance(), priced.total)?;

        let transaction = Transaction {
            transaction_id: TransactionId::new(),
            user_id: command.user_id,
            kind: TransactionKind::Completion,
            points_delta: priced.total,
            items: priced.items,
            actor_id: command.actor_id,
            created_at: Utc::now(),
        };
        let transaction_id = transaction.transaction_id;

        resident.apply(balance);
        self.inner.transactions.write().await.push(transaction);

        Ok(LedgerReceipt {
            transaction_id,
            new_balance: balance.current_points,
            total_points: balance.total_points,
        })
    }

    async fn redeem_products(&self, command: &RedemptionCommand) -> PointsResult<LedgerReceipt> {
        let cell = self.resident_cell(command.user_id).await?;
        let mut resident = cell.lock().await;
        ensure_can_transact(&resident)?;

        let mut catalog = self.inner.catalog.write().await;
        let products: Vec<Product> = command
            .products
            .iter()
            .filter_map(|line| catalog.products.get(&line.product_id).cloned())
            .collect();
        let priced = price_redemption(&command.products, &products)?;
        let balance = debit(resident.balance(), priced.total)?;
        let delta = priced.total.checked_neg().ok_or_else(|| {
            PointsError::Validation("Point total is out of range".to_string())
        })?;

        for line in &command.products {
            if let Some(product) = catalog.products.get_mut(&line.product_id) {
                product.quantity -= line.quantity;
            }
        }
        drop(catalog);

        let transaction = Transaction {
            transaction_id: TransactionId::new(),
            user_id: command.user_id,
            kind: TransactionKind::Redemption,
            points_delta: delta,
            items: priced.items,
            actor_id: command.actor_id,
            created_at: Utc::now(),
        };
        let transaction_id = transaction.transaction_id;

        resident.apply(balance);
        self.inner.transactions.write().await.push(transaction);

        Ok(LedgerReceipt {
            transaction_id,
            new_balance: balance.current_points,
            total_points: balance.total_points,
        })
    }

    async fn history(&self, user_id: UserId, page: Page) -> PointsResult<Vec<Transaction>> {
        let transactions = self.inner.transactions.read().await;
        let mut own: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        // Insertion order breaks timestamp ties, newest last
        own.reverse();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(own
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect())
    }
}

impl LeaderboardRepository for InMemoryPointsRepository {
    async fn scores(
        &self,
        source: ScoreSource,
        batch_number: Option<i32>,
    ) -> PointsResult<Vec<ScoreRow>> {
        let residents = self.snapshot().await;
        let transactions = self.inner.transactions.read().await;

        Ok(residents
            .into_iter()
            .filter(|r| !r.is_archived)
            .filter(|r| batch_number.is_none_or(|b| r.batch_number == b))
            .map(|r| {
                let points = match source {
                    ScoreSource::CurrentPoints => r.current_points,
                    ScoreSource::TotalPoints => r.total_points,
                    ScoreSource::EarnedSince(since) => transactions
                        .iter()
                        .filter(|t| {
                            t.user_id == r.user_id
                                && t.kind == TransactionKind::Completion
                                && t.created_at >= since
                        })
                        .map(|t| t.points_delta)
                        .sum(),
                };
                ScoreRow {
                    user_id: r.user_id,
                    user_name: r.user_name,
                    batch_number: r.batch_number,
                    points,
                }
            })
            .collect())
    }
}

impl ArchiveRepository for InMemoryPointsRepository {
    async fn activity(&self) -> PointsResult<Vec<ResidentActivity>> {
        let residents = self.snapshot().await;
        let transactions = self.inner.transactions.read().await;

        Ok(residents
            .iter()
            .filter(|r| !r.is_archived)
            .map(|r| activity_of(r, &transactions))
            .collect())
    }

    async fn archive_resident(&self, user_id: UserId, cutoff: DateTime<Utc>) -> PointsResult<bool> {
        let cell = self.resident_cell(user_id).await?;
        let mut resident = cell.lock().await;
        if resident.is_archived {
            return Ok(false);
        }

        let transactions = self.inner.transactions.read().await;
        if !is_inactive(&activity_of(&resident, &transactions), cutoff) {
            return Ok(false);
        }

        resident.is_archived = true;
        Ok(true)
    }
}
