//! Domain Services
//!
//! Pure ledger, ranking and inactivity rules shared by every repository
//! implementation. Nothing here touches storage.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Months, NaiveTime, Utc};
use kernel::id::{ProductId, TaskId};

use crate::domain::entities::{
    Balance, ItemRef, LeaderboardEntry, Product, ProductLine, Resident, ResidentActivity,
    ScoreRow, Task, TaskLine, TransactionItem,
};
use crate::domain::value_objects::MonthsThreshold;
use crate::error::{PointsError, PointsResult};

/// Priced lines plus their sum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Priced {
    pub items: Vec<TransactionItem>,
    pub total: i64,
}

fn overflow() -> PointsError {
    PointsError::Validation("Point total is out of range".to_string())
}

// ============================================================================
// Request aggregation
// ============================================================================

/// Collapse repeated task references into counted lines
pub fn aggregate_tasks(task_ids: &[TaskId]) -> PointsResult<Vec<TaskLine>> {
    if task_ids.is_empty() {
        return Err(PointsError::Validation(
            "At least one task is required".to_string(),
        ));
    }

    let mut counts: BTreeMap<TaskId, i64> = BTreeMap::new();
    for id in task_ids {
        *counts.entry(*id).or_default() += 1;
    }

    Ok(counts
        .into_iter()
        .map(|(task_id, quantity)| TaskLine { task_id, quantity })
        .collect())
}

/// Merge product lines by id; every quantity must be at least 1
pub fn aggregate_products(lines: &[ProductLine]) -> PointsResult<Vec<ProductLine>> {
    if lines.is_empty() {
        return Err(PointsError::Validation(
            "At least one product is required".to_string(),
        ));
    }

    let mut counts: BTreeMap<ProductId, i64> = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(PointsError::Validation(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        let entry = counts.entry(line.product_id).or_default();
        *entry = entry.checked_add(line.quantity).ok_or_else(overflow)?;
    }

    Ok(counts
        .into_iter()
        .map(|(product_id, quantity)| ProductLine {
            product_id,
            quantity,
        })
        .collect())
}

// ============================================================================
// Pricing
// ============================================================================

/// Price a completion against the loaded task rows
///
/// Unknown ids are reported together; inactive tasks are rejected.
pub fn price_completion(lines: &[TaskLine], tasks: &[Task]) -> PointsResult<Priced> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.task_id, t)).collect();

    let missing: Vec<TaskId> = lines
        .iter()
        .map(|l| l.task_id)
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(PointsError::TasksNotFound(missing));
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        let task = by_id[&line.task_id];
        if !task.is_active {
            return Err(PointsError::Validation(format!(
                "Task {} is not active",
                task.task_id
            )));
        }
        let subtotal = task
            .points
            .checked_mul(line.quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(subtotal).ok_or_else(overflow)?;
        items.push(TransactionItem {
            item: ItemRef::Task(task.task_id),
            quantity: line.quantity,
            unit_points: task.points,
        });
    }

    Ok(Priced { items, total })
}

/// Price a redemption against the loaded (locked) product rows
pub fn price_redemption(lines: &[ProductLine], products: &[Product]) -> PointsResult<Priced> {
    let by_id: HashMap<ProductId, &Product> =
        products.iter().map(|p| (p.product_id, p)).collect();

    let missing: Vec<ProductId> = lines
        .iter()
        .map(|l| l.product_id)
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(PointsError::ProductsNotFound(missing));
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        let product = by_id[&line.product_id];
        if !product.is_available {
            return Err(PointsError::Validation(format!(
                "Product {} is not available",
                product.product_id
            )));
        }
        if product.quantity < line.quantity {
            return Err(PointsError::Validation(format!(
                "Product {} has only {} in stock",
                product.product_id, product.quantity
            )));
        }
        let subtotal = product
            .points
            .checked_mul(line.quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(subtotal).ok_or_else(overflow)?;
        items.push(TransactionItem {
            item: ItemRef::Product(product.product_id),
            quantity: line.quantity,
            unit_points: product.points,
        });
    }

    Ok(Priced { items, total })
}

// ============================================================================
// Balance arithmetic
// ============================================================================

/// Archived residents cannot transact
pub fn ensure_can_transact(resident: &Resident) -> PointsResult<()> {
    if resident.is_archived {
        return Err(PointsError::Validation(format!(
            "Resident {} is archived",
            resident.user_id
        )));
    }
    Ok(())
}

/// Completion raises both counters
pub fn credit(balance: Balance, amount: i64) -> PointsResult<Balance> {
    Ok(Balance {
        current_points: balance
            .current_points
            .checked_add(amount)
            .ok_or_else(overflow)?,
        total_points: balance
            .total_points
            .checked_add(amount)
            .ok_or_else(overflow)?,
    })
}

/// Redemption lowers only the spendable balance
pub fn debit(balance: Balance, cost: i64) -> PointsResult<Balance> {
    if balance.current_points < cost {
        return Err(PointsError::InsufficientPoints {
            required: cost,
            available: balance.current_points,
        });
    }
    Ok(Balance {
        current_points: balance.current_points - cost,
        total_points: balance.total_points,
    })
}

// ============================================================================
// Ranking
// ============================================================================

/// Dense ranking: points descending, ties share a rank, user id breaks order
pub fn dense_rank(mut rows: Vec<ScoreRow>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| b.points.cmp(&a.points).then(a.user_id.cmp(&b.user_id)));

    let mut rank = 0u32;
    let mut previous: Option<i64> = None;
    rows.into_iter()
        .map(|row| {
            if previous != Some(row.points) {
                rank += 1;
                previous = Some(row.points);
            }
            LeaderboardEntry {
                rank,
                user_id: row.user_id,
                user_name: row.user_name,
                batch_number: row.batch_number,
                points: row.points,
            }
        })
        .collect()
}

// ============================================================================
// Inactivity
// ============================================================================

/// `now` minus the threshold in calendar months
pub fn archive_cutoff(now: DateTime<Utc>, months: MonthsThreshold) -> PointsResult<DateTime<Utc>> {
    now.checked_sub_months(Months::new(months.get()))
        .ok_or_else(|| PointsError::Validation("monthsThreshold is out of range".to_string()))
}

/// Latest of transaction and abscondence, falling back to admission
pub fn last_activity(activity: &ResidentActivity) -> DateTime<Utc> {
    match (activity.last_transaction_at, activity.last_abscondence) {
        (Some(tx), Some(abs)) => tx.max(abs),
        (Some(at), None) | (None, Some(at)) => at,
        (None, None) => activity
            .date_of_admission
            .and_time(NaiveTime::MIN)
            .and_utc(),
    }
}

pub fn is_inactive(activity: &ResidentActivity, cutoff: DateTime<Utc>) -> bool {
    last_activity(activity) < cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use kernel::id::UserId;

    fn task(id: i64, points: i64, is_active: bool) -> Task {
        Task {
            task_id: TaskId::new(id),
            task_name: format!("task {id}"),
            category: "chores".into(),
            points,
            is_active,
        }
    }

    fn product(id: i64, points: i64, quantity: i64) -> Product {
        Product {
            product_id: ProductId::new(id),
            product_name: format!("product {id}"),
            category: "snacks".into(),
            points,
            quantity,
            is_available: true,
        }
    }

    fn row(user_id: i64, points: i64) -> ScoreRow {
        ScoreRow {
            user_id: UserId::new(user_id),
            user_name: format!("resident {user_id}"),
            batch_number: 1,
            points,
        }
    }

    #[test]
    fn test_duplicate_tasks_are_counted() {
        let lines = aggregate_tasks(&[TaskId::new(2), TaskId::new(1), TaskId::new(2)]).unwrap();
        assert_eq!(
            lines,
            vec![
                TaskLine {
                    task_id: TaskId::new(1),
                    quantity: 1
                },
                TaskLine {
                    task_id: TaskId::new(2),
                    quantity: 2
                },
            ]
        );

        let priced = price_completion(&lines, &[task(1, 10, true), task(2, 20, true)]).unwrap();
        assert_eq!(priced.total, 50);
        assert_eq!(priced.items.len(), 2);
    }

    #[test]
    fn test_empty_requests_are_rejected() {
        assert!(matches!(aggregate_tasks(&[]), Err(PointsError::Validation(_))));
        assert!(matches!(
            aggregate_products(&[]),
            Err(PointsError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let err = aggregate_products(&[ProductLine {
            product_id: ProductId::new(1),
            quantity: 0,
        }])
        .unwrap_err();
        assert!(matches!(err, PointsError::Validation(_)));
    }

    #[test]
    fn test_missing_tasks_are_all_reported() {
        let lines = aggregate_tasks(&[TaskId::new(1), TaskId::new(7), TaskId::new(9)]).unwrap();
        let err = price_completion(&lines, &[task(1, 10, true)]).unwrap_err();
        match err {
            PointsError::TasksNotFound(ids) => {
                assert_eq!(ids, vec![TaskId::new(7), TaskId::new(9)])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_inactive_task_is_validation() {
        let lines = aggregate_tasks(&[TaskId::new(1)]).unwrap();
        let err = price_completion(&lines, &[task(1, 10, false)]).unwrap_err();
        assert!(matches!(err, PointsError::Validation(_)));
    }

    #[test]
    fn test_redemption_checks_stock_and_availability() {
        let lines = aggregate_products(&[ProductLine {
            product_id: ProductId::new(1),
            quantity: 3,
        }])
        .unwrap();

        assert!(matches!(
            price_redemption(&lines, &[product(1, 5, 2)]),
            Err(PointsError::Validation(_))
        ));

        let mut hidden = product(1, 5, 10);
        hidden.is_available = false;
        assert!(matches!(
            price_redemption(&lines, &[hidden]),
            Err(PointsError::Validation(_))
        ));

        assert_eq!(price_redemption(&lines, &[product(1, 5, 3)]).unwrap().total, 15);
        assert!(matches!(
            price_redemption(&lines, &[]),
            Err(PointsError::ProductsNotFound(_))
        ));
    }

    #[test]
    fn test_overflow_is_validation() {
        let lines = aggregate_tasks(&[TaskId::new(1), TaskId::new(1)]).unwrap();
        let err = price_completion(&lines, &[task(1, i64::MAX, true)]).unwrap_err();
        assert!(matches!(err, PointsError::Validation(_)));

        let full = Balance {
            current_points: i64::MAX,
            total_points: i64::MAX,
        };
        assert!(matches!(credit(full, 1), Err(PointsError::Validation(_))));
    }

    #[test]
    fn test_debit_keeps_total_and_never_goes_negative() {
        let balance = Balance {
            current_points: 100,
            total_points: 250,
        };

        let after = debit(balance, 100).unwrap();
        assert_eq!(after.current_points, 0);
        assert_eq!(after.total_points, 250);

        match debit(balance, 120) {
            Err(PointsError::InsufficientPoints {
                required,
                available,
            }) => {
                assert_eq!(required, 120);
                assert_eq!(available, 100);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_dense_rank_with_ties() {
        let ranked = dense_rank(vec![row(3, 30), row(2, 50), row(1, 50), row(4, 10)]);
        let view: Vec<(i64, u32)> = ranked.iter().map(|e| (e.user_id.get(), e.rank)).collect();
        assert_eq!(view, vec![(1, 1), (2, 1), (3, 2), (4, 3)]);
    }

    #[test]
    fn test_last_activity_prefers_latest_timestamp() {
        let admission = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let tx = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let abs = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();

        let mut activity = ResidentActivity {
            user_id: UserId::new(1),
            date_of_admission: admission,
            last_transaction_at: None,
            last_abscondence: None,
        };
        assert_eq!(
            last_activity(&activity),
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()
        );

        activity.last_transaction_at = Some(tx);
        assert_eq!(last_activity(&activity), tx);

        activity.last_abscondence = Some(abs);
        assert_eq!(last_activity(&activity), abs);
    }

    #[test]
    fn test_cutoff_uses_calendar_months() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).unwrap();
        let cutoff = archive_cutoff(now, MonthsThreshold::new(6).unwrap()).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2026, 2, 28, 0, 0, 0).unwrap());
    }
}
