//! PostgreSQL Repository Implementations
//!
//! Ledger writes run in one transaction: the resident row is locked with
//! `FOR UPDATE`, product rows in ascending id order, and `SET LOCAL`
//! timeouts turn lock contention into a retryable conflict.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::{ProductId, TaskId, TransactionId, UserId};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::domain::entities::{
    CompletionCommand, ItemRef, LedgerReceipt, Product, RedemptionCommand, Resident,
    ResidentActivity, ScoreRow, Task, Transaction, TransactionItem,
};
use crate::domain::repository::{ArchiveRepository, LeaderboardRepository, LedgerRepository};
use crate::domain::services::{
    Priced, credit, debit, ensure_can_transact, is_inactive, price_completion, price_redemption,
};
use crate::domain::value_objects::{Page, ScoreSource, TransactionKind};
use crate::error::{PointsError, PointsResult};

const SELECT_RESIDENT: &str = r#"
    SELECT
        r.user_id,
        u.user_name,
        r.batch_number,
        r.current_points,
        r.total_points,
        r.date_of_admission,
        r.last_abscondence,
        r.is_archived
    FROM residents r
    JOIN users u ON u.user_id = r.user_id
"#;

/// PostgreSQL-backed points repository
#[derive(Clone)]
pub struct PgPointsRepository {
    pool: PgPool,
    store_timeout: Duration,
}

impl PgPointsRepository {
    pub fn new(pool: PgPool, store_timeout: Duration) -> Self {
        Self {
            pool,
            store_timeout,
        }
    }

    /// Open a transaction with lock and statement timeouts applied
    async fn begin(&self) -> PointsResult<sqlx::Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        let timeout = format!("{}ms", self.store_timeout.as_millis());

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    async fn lock_resident(
        tx: &mut sqlx::Transaction<'static, Postgres>,
        user_id: UserId,
    ) -> PointsResult<Resident> {
        let row = sqlx::query_as::<_, ResidentRow>(&format!(
            "{SELECT_RESIDENT} WHERE r.user_id = $1 FOR UPDATE OF r"
        ))
        .bind(user_id.get())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(PointsError::ResidentNotFound(user_id))?;

        let resident = row.into_resident();
        ensure_can_transact(&resident)?;
        Ok(resident)
    }

    async fn insert_transaction(
        tx: &mut sqlx::Transaction<'static, Postgres>,
        transaction: &Transaction,
    ) -> PointsResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                transaction_id,
                user_id,
                kind,
                points_delta,
                actor_id,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transaction.transaction_id.as_uuid())
        .bind(transaction.user_id.get())
        .bind(transaction.kind.as_str())
        .bind(transaction.points_delta)
        .bind(transaction.actor_id.get())
        .bind(transaction.created_at)
        .execute(&mut **tx)
        .await?;

        for item in &transaction.items {
            let (task_id, product_id) = match item.item {
                ItemRef::Task(id) => (Some(id.get()), None),
                ItemRef::Product(id) => (None, Some(id.get())),
            };
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id,
                    task_id,
                    product_id,
                    quantity,
                    unit_points
                ) VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(transaction.transaction_id.as_uuid())
            .bind(task_id)
            .bind(product_id)
            .bind(item.quantity)
            .bind(item.unit_points)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    fn new_transaction(
        user_id: UserId,
        actor_id: UserId,
        kind: TransactionKind,
        points_delta: i64,
        priced: Priced,
    ) -> Transaction {
        Transaction {
            transaction_id: TransactionId::new(),
            user_id,
            kind,
            points_delta,
            items: priced.items,
            actor_id,
            created_at: Utc::now(),
        }
    }
}

impl LedgerRepository for PgPointsRepository {
    async fn find_resident(&self, user_id: UserId) -> PointsResult<Option<Resident>> {
        let row = sqlx::query_as::<_, ResidentRow>(&format!("{SELECT_RESIDENT} WHERE r.user_id = $1"))
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ResidentRow::into_resident))
    }

    async fn complete_tasks(&self, command: &CompletionCommand) -> PointsResult<LedgerReceipt> {
        let mut tx = self.begin().await?;
        let resident = Self::lock_resident(&mut tx, command.user_id).await?;

        let ids: Vec<i64> = command.tasks.iter().map(|l| l.task_id.get()).collect();
        let tasks: Vec<Task> = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT task_id, task_name, category, points, is_active
            FROM tasks
            WHERE task_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(TaskRow::into_task)
        .collect();

        let priced = price_completion(&command.tasks, &tasks)?;
        let balance = credit(resident.balance(), priced.total)?;

        sqlx::query(
            r#"
            UPDATE residents
            SET current_points = $2, total_points = $3
            WHERE user_id = $1
            "#,
        )
        .bind(command.user_id.get())
        .bind(balance.current_points)
        .bind(balance.total_points)
        .execute(&mut *tx)
        .await?;

        let total = priced.total;
        let transaction = Self::new_transaction(
            command.user_id,
            command.actor_id,
            TransactionKind::Completion,
            total,
            priced,
        );
        Self::insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            user_id = %command.user_id,
            actor_id = %command.actor_id,
            points = total,
            new_balance = balance.current_points,
            "Completion recorded"
        );

        Ok(LedgerReceipt {
            transaction_id: transaction.transaction_id,
            new_balance: balance.current_points,
            total_points: balance.total_points,
        })
    }

    async fn redeem_products(&self, command: &RedemptionCommand) -> PointsResult<LedgerReceipt> {
        let mut tx = self.begin().await?;
        let resident = Self::lock_resident(&mut tx, command.user_id).await?;

        let ids: Vec<i64> = command.product_ids().iter().map(|id| id.get()).collect();
        let products: Vec<Product> = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, product_name, category, points, quantity, is_available
            FROM products
            WHERE product_id = ANY($1)
            ORDER BY product_id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(ProductRow::into_product)
        .collect();

        let priced = price_redemption(&command.products, &products)?;
        let balance = debit(resident.balance(), priced.total)?;

        sqlx::query("UPDATE residents SET current_points = $2 WHERE user_id = $1")
            .bind(command.user_id.get())
            .bind(balance.current_points)
            .execute(&mut *tx)
            .await?;

        for line in &command.products {
            sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE product_id = $1")
                .bind(line.product_id.get())
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        let cost = priced.total;
        let transaction = Self::new_transaction(
            command.user_id,
            command.actor_id,
            TransactionKind::Redemption,
            -cost,
            priced,
        );
        Self::insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction.transaction_id,
            user_id = %command.user_id,
            actor_id = %command.actor_id,
            points = cost,
            new_balance = balance.current_points,
            "Redemption recorded"
        );

        Ok(LedgerReceipt {
            transaction_id: transaction.transaction_id,
            new_balance: balance.current_points,
            total_points: balance.total_points,
        })
    }

    async fn history(&self, user_id: UserId, page: Page) -> PointsResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, user_id, kind, points_delta, actor_id, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, transaction_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.get())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.transaction_id).collect();
        let item_rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT transaction_id, task_id, product_id, quantity, unit_points
            FROM transaction_items
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, task_id NULLS LAST, product_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<TransactionItem>> = HashMap::new();
        for row in item_rows {
            let id = row.transaction_id;
            items.entry(id).or_default().push(row.into_item()?);
        }

        rows.into_iter()
            .map(|row| {
                let own = items.remove(&row.transaction_id).unwrap_or_default();
                row.into_transaction(own)
            })
            .collect()
    }
}

impl LeaderboardRepository for PgPointsRepository {
    async fn scores(
        &self,
        source: ScoreSource,
        batch_number: Option<i32>,
    ) -> PointsResult<Vec<ScoreRow>> {
        let rows = match source {
            ScoreSource::CurrentPoints | ScoreSource::TotalPoints => {
                let column = if source == ScoreSource::CurrentPoints {
                    "r.current_points"
                } else {
                    "r.total_points"
                };
                sqlx::query_as::<_, ScoreRowRecord>(&format!(
                    r#"
                    SELECT r.user_id, u.user_name, r.batch_number, {column} AS points
                    FROM residents r
                    JOIN users u ON u.user_id = r.user_id
                    WHERE NOT r.is_archived
                      AND ($1::INT IS NULL OR r.batch_number = $1)
                    "#
                ))
                .bind(batch_number)
                .fetch_all(&self.pool)
                .await?
            }
            ScoreSource::EarnedSince(since) => {
                sqlx::query_as::<_, ScoreRowRecord>(
                    r#"
                    SELECT
                        r.user_id,
                        u.user_name,
                        r.batch_number,
                        COALESCE(SUM(t.points_delta), 0)::BIGINT AS points
                    FROM residents r
                    JOIN users u ON u.user_id = r.user_id
                    LEFT JOIN transactions t
                        ON t.user_id = r.user_id
                       AND t.kind = 'completion'
                       AND t.created_at >= $2
                    WHERE NOT r.is_archived
                      AND ($1::INT IS NULL OR r.batch_number = $1)
                    GROUP BY r.user_id, u.user_name, r.batch_number
                    "#,
                )
                .bind(batch_number)
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(ScoreRowRecord::into_score).collect())
    }
}

impl ArchiveRepository for PgPointsRepository {
    async fn activity(&self) -> PointsResult<Vec<ResidentActivity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                r.user_id,
                r.date_of_admission,
                r.last_abscondence,
                MAX(t.created_at) AS last_transaction_at
            FROM residents r
            LEFT JOIN transactions t ON t.user_id = r.user_id
            WHERE NOT r.is_archived
            GROUP BY r.user_id, r.date_of_admission, r.last_abscondence
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityRow::into_activity).collect())
    }

    async fn archive_resident(&self, user_id: UserId, cutoff: DateTime<Utc>) -> PointsResult<bool> {
        let mut tx = self.begin().await?;

        // Ledger writes hold this row lock until commit, so the activity read
        // below sees every transaction committed before the flag is set.
        let locked = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM residents WHERE user_id = $1 AND NOT is_archived FOR UPDATE",
        )
        .bind(user_id.get())
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        let activity = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                r.user_id,
                r.date_of_admission,
                r.last_abscondence,
                (SELECT MAX(t.created_at) FROM transactions t WHERE t.user_id = r.user_id)
                    AS last_transaction_at
            FROM residents r
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id.get())
        .fetch_one(&mut *tx)
        .await?
        .into_activity();

        if !is_inactive(&activity, cutoff) {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE residents SET is_archived = TRUE WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ResidentRow {
    user_id: i64,
    user_name: String,
    batch_number: i32,
    current_points: i64,
    total_points: i64,
    date_of_admission: NaiveDate,
    last_abscondence: Option<DateTime<Utc>>,
    is_archived: bool,
}

impl ResidentRow {
    fn into_resident(self) -> Resident {
        Resident {
            user_id: UserId::new(self.user_id),
            user_name: self.user_name,
            batch_number: self.batch_number,
            current_points: self.current_points,
            total_points: self.total_points,
            date_of_admission: self.date_of_admission,
            last_abscondence: self.last_abscondence,
            is_archived: self.is_archived,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: i64,
    task_name: String,
    category: String,
    points: i64,
    is_active: bool,
}

impl TaskRow {
    fn into_task(self) -> Task {
        Task {
            task_id: TaskId::new(self.task_id),
            task_name: self.task_name,
            category: self.category,
            points: self.points,
            is_active: self.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_id: i64,
    product_name: String,
    category: String,
    points: i64,
    quantity: i64,
    is_available: bool,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            product_id: ProductId::new(self.product_id),
            product_name: self.product_name,
            category: self.category,
            points: self.points,
            quantity: self.quantity,
            is_available: self.is_available,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    transaction_id: Uuid,
    user_id: i64,
    kind: String,
    points_delta: i64,
    actor_id: i64,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self, items: Vec<TransactionItem>) -> PointsResult<Transaction> {
        Ok(Transaction {
            transaction_id: TransactionId::from_uuid(self.transaction_id),
            user_id: UserId::new(self.user_id),
            kind: self.kind.parse()?,
            points_delta: self.points_delta,
            items,
            actor_id: UserId::new(self.actor_id),
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    transaction_id: Uuid,
    task_id: Option<i64>,
    product_id: Option<i64>,
    quantity: i64,
    unit_points: i64,
}

impl ItemRow {
    fn into_item(self) -> PointsResult<TransactionItem> {
        let item = match (self.task_id, self.product_id) {
            (Some(id), None) => ItemRef::Task(TaskId::new(id)),
            (None, Some(id)) => ItemRef::Product(ProductId::new(id)),
            _ => {
                return Err(PointsError::Internal(format!(
                    "Transaction item of {} must reference exactly one task or product",
                    self.transaction_id
                )));
            }
        };
        Ok(TransactionItem {
            item,
            quantity: self.quantity,
            unit_points: self.unit_points,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ScoreRowRecord {
    user_id: i64,
    user_name: String,
    batch_number: i32,
    points: i64,
}

impl ScoreRowRecord {
    fn into_score(self) -> ScoreRow {
        ScoreRow {
            user_id: UserId::new(self.user_id),
            user_name: self.user_name,
            batch_number: self.batch_number,
            points: self.points,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    user_id: i64,
    date_of_admission: NaiveDate,
    last_abscondence: Option<DateTime<Utc>>,
    last_transaction_at: Option<DateTime<Utc>>,
}

impl ActivityRow {
    fn into_activity(self) -> ResidentActivity {
        ResidentActivity {
            user_id: UserId::new(self.user_id),
            date_of_admission: self.date_of_admission,
            last_transaction_at: self.last_transaction_at,
            last_abscondence: self.last_abscondence,
        }
    }
}
