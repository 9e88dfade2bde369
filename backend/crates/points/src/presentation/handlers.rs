//! HTTP Handlers

use std::sync::Arc;

use auth::AuthenticatedUser;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use kernel::id::{ProductId, TaskId, UserId};

use crate::application::config::PointsConfig;
use crate::application::{
    ArchiveJob, CompleteTasksInput, CompleteTasksUseCase, GetLeaderboardUseCase,
    LeaderboardQuery, RedeemProductsInput, RedeemProductsUseCase, ResidentBalanceUseCase,
    TopPerformersUseCase, TransactionHistoryUseCase, UserPositionUseCase,
};
use crate::domain::entities::{ArchiveReport, ProductLine};
use crate::domain::repository::PointsRepository;
use crate::domain::value_objects::Page;
use crate::error::{PointsError, PointsResult};
use crate::presentation::dto::{
    ArchiveRequest, BalanceResponse, CompletionRequest, HistoryResponse, LeaderboardParams,
    LeaderboardResponse, LedgerReceiptResponse, PageParams, PositionParams, PositionResponse,
    RedemptionRequest, TopPerformersParams, TransactionResponse,
};

/// Shared state for points handlers
#[derive(Clone)]
pub struct PointsAppState<R>
where
    R: PointsRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<PointsConfig>,
    pub archive: ArchiveJob<R>,
}

impl<R> PointsAppState<R>
where
    R: PointsRepository,
{
    pub fn new(repo: R, config: PointsConfig) -> Self {
        let repo = Arc::new(repo);
        Self {
            archive: ArchiveJob::new(repo.clone()),
            repo,
            config: Arc::new(config),
        }
    }
}

fn bad_json(rejection: JsonRejection) -> PointsError {
    PointsError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

fn bad_query(rejection: QueryRejection) -> PointsError {
    PointsError::Validation(format!("Invalid query: {}", rejection.body_text()))
}

fn bad_path(rejection: PathRejection) -> PointsError {
    PointsError::Validation(format!("Invalid path: {}", rejection.body_text()))
}

fn ensure_access(caller: &AuthenticatedUser, user_id: UserId) -> PointsResult<()> {
    if caller.can_access(user_id) {
        Ok(())
    } else {
        Err(PointsError::Forbidden)
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// POST /transactions/completion
pub async fn complete_tasks<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> PointsResult<Json<LedgerReceiptResponse>>
where
    R: PointsRepository,
{
    let Json(req) = body.map_err(bad_json)?;
    let input = CompleteTasksInput {
        user_id: UserId::new(req.user_id),
        task_ids: req.tasks.iter().map(|t| TaskId::new(t.id)).collect(),
    };

    let use_case = CompleteTasksUseCase::new(state.repo.clone());
    let receipt = use_case.execute(caller.user_id, input).await?;
    Ok(Json(receipt.into()))
}

/// POST /transactions/redemption
pub async fn redeem_products<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    body: Result<Json<RedemptionRequest>, JsonRejection>,
) -> PointsResult<Json<LedgerReceiptResponse>>
where
    R: PointsRepository,
{
    let Json(req) = body.map_err(bad_json)?;
    let input = RedeemProductsInput {
        user_id: UserId::new(req.user_id),
        products: req
            .products
            .iter()
            .map(|p| ProductLine {
                product_id: ProductId::new(p.id),
                quantity: p.quantity,
            })
            .collect(),
    };

    let use_case = RedeemProductsUseCase::new(state.repo.clone());
    let receipt = use_case.execute(caller.user_id, input).await?;
    Ok(Json(receipt.into()))
}

/// GET /transactions/user/{user_id}
pub async fn transaction_history<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> PointsResult<Json<HistoryResponse>>
where
    R: PointsRepository,
{
    let Path(user_id) = path.map_err(bad_path)?;
    let user_id = UserId::new(user_id);
    ensure_access(&caller, user_id)?;

    let Query(params) = params.map_err(bad_query)?;
    let page = Page::new(params.limit, params.offset)?;

    let use_case = TransactionHistoryUseCase::new(state.repo.clone());
    let transactions = use_case.execute(user_id, page).await?;

    Ok(Json(HistoryResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
        limit: page.limit(),
        offset: page.offset(),
    }))
}

// ============================================================================
// Residents
// ============================================================================

/// GET /residents/{user_id}/balance
pub async fn resident_balance<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
) -> PointsResult<Json<BalanceResponse>>
where
    R: PointsRepository,
{
    let Path(user_id) = path.map_err(bad_path)?;
    let user_id = UserId::new(user_id);
    ensure_access(&caller, user_id)?;

    let use_case = ResidentBalanceUseCase::new(state.repo.clone());
    let resident = use_case.execute(user_id).await?;
    Ok(Json(resident.into()))
}

/// POST /residents/archive
pub async fn archive_residents<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    body: Bytes,
) -> PointsResult<Json<ArchiveReport>>
where
    R: PointsRepository,
{
    let req: ArchiveRequest = if body.is_empty() {
        ArchiveRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| PointsError::Validation(format!("Invalid request body: {e}")))?
    };
    let months = req
        .months_threshold
        .unwrap_or(i64::from(state.config.archive_months_threshold));

    tracing::info!(actor_id = %caller.user_id, months, "Manual archive sweep requested");
    let report = state.archive.archive_inactive_residents(months).await?;
    Ok(Json(report))
}

// ============================================================================
// Leaderboard
// ============================================================================

/// GET /leaderboard
pub async fn leaderboard<R>(
    State(state): State<PointsAppState<R>>,
    params: Result<Query<LeaderboardParams>, QueryRejection>,
) -> PointsResult<Json<LeaderboardResponse>>
where
    R: PointsRepository,
{
    let Query(params) = params.map_err(bad_query)?;
    let query = LeaderboardQuery {
        kind: params.kind.unwrap_or_default(),
        period: params.period.unwrap_or_default(),
        batch_number: params.batch_number,
        page: Page::new(params.limit, params.offset)?,
    };

    let use_case = GetLeaderboardUseCase::new(state.repo.clone());
    let page = use_case.execute(query).await?;
    Ok(Json(page.into()))
}

/// GET /leaderboard/top
pub async fn top_performers<R>(
    State(state): State<PointsAppState<R>>,
    params: Result<Query<TopPerformersParams>, QueryRejection>,
) -> PointsResult<Json<LeaderboardResponse>>
where
    R: PointsRepository,
{
    let Query(params) = params.map_err(bad_query)?;

    let use_case = TopPerformersUseCase::new(state.repo.clone());
    let page = use_case
        .execute(params.period.unwrap_or_default(), params.limit)
        .await?;
    Ok(Json(page.into()))
}

/// GET /leaderboard/user/{user_id}/position
pub async fn user_position<R>(
    State(state): State<PointsAppState<R>>,
    caller: AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<PositionParams>, QueryRejection>,
) -> PointsResult<Json<PositionResponse>>
where
    R: PointsRepository,
{
    let Path(user_id) = path.map_err(bad_path)?;
    let user_id = UserId::new(user_id);
    ensure_access(&caller, user_id)?;
    let Query(params) = params.map_err(bad_query)?;

    let use_case = UserPositionUseCase::new(state.repo.clone());
    let position = use_case
        .execute(
            user_id,
            params.kind.unwrap_or_default(),
            params.period.unwrap_or_default(),
        )
        .await?;

    Ok(Json(position.into()))
}
