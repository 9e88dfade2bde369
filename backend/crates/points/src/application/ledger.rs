//! Ledger Use Cases
//!
//! Completion credits a resident, redemption debits one. Both are recorded by
//! staff; the acting user id is stored on the transaction.

use std::sync::Arc;

use kernel::id::{TaskId, UserId};

use crate::domain::entities::{
    CompletionCommand, LedgerReceipt, ProductLine, RedemptionCommand, Resident, Transaction,
};
use crate::domain::repository::LedgerRepository;
use crate::domain::value_objects::Page;
use crate::error::{PointsError, PointsResult};

/// Input DTO for a task completion
#[derive(Debug, Clone)]
pub struct CompleteTasksInput {
    pub user_id: UserId,
    /// Repeats count once per occurrence
    pub task_ids: Vec<TaskId>,
}

/// Input DTO for a product redemption
#[derive(Debug, Clone)]
pub struct RedeemProductsInput {
    pub user_id: UserId,
    pub products: Vec<ProductLine>,
}

/// Complete Tasks Use Case
pub struct CompleteTasksUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> CompleteTasksUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor_id: UserId,
        input: CompleteTasksInput,
    ) -> PointsResult<LedgerReceipt> {
        let command = CompletionCommand::new(input.user_id, actor_id, &input.task_ids)?;
        self.repo.complete_tasks(&command).await
    }
}

/// Redeem Products Use Case
pub struct RedeemProductsUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> RedeemProductsUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        actor_id: UserId,
        input: RedeemProductsInput,
    ) -> PointsResult<LedgerReceipt> {
        let command = RedemptionCommand::new(input.user_id, actor_id, &input.products)?;
        self.repo.redeem_products(&command).await
    }
}

/// Transaction History Use Case
pub struct TransactionHistoryUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> TransactionHistoryUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId, page: Page) -> PointsResult<Vec<Transaction>> {
        if self.repo.find_resident(user_id).await?.is_none() {
            return Err(PointsError::ResidentNotFound(user_id));
        }
        self.repo.history(user_id, page).await
    }
}

/// Resident Balance Use Case
pub struct ResidentBalanceUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> ResidentBalanceUseCase<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: UserId) -> PointsResult<Resident> {
        self.repo
            .find_resident(user_id)
            .await?
            .ok_or(PointsError::ResidentNotFound(user_id))
    }
}
