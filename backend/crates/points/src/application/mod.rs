//! Application Layer - Use cases

pub mod archive;
pub mod config;
pub mod leaderboard;
pub mod ledger;

pub use archive::ArchiveJob;
pub use leaderboard::{
    GetLeaderboardUseCase, LeaderboardPage, LeaderboardQuery, TopPerformersUseCase, UserPosition,
    UserPositionUseCase,
};
pub use ledger::{
    CompleteTasksInput, CompleteTasksUseCase, RedeemProductsInput, RedeemProductsUseCase,
    ResidentBalanceUseCase, TransactionHistoryUseCase,
};
