//! Domain Value Objects

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PointsError, PointsResult};

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Task completion, credits points
    Completion,
    /// Product redemption, debits points
    Redemption,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Completion => "completion",
            TransactionKind::Redemption => "redemption",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = PointsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completion" => Ok(TransactionKind::Completion),
            "redemption" => Ok(TransactionKind::Redemption),
            other => Err(PointsError::Internal(format!(
                "Unknown transaction kind: {other}"
            ))),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which balance a leaderboard ranks by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardType {
    /// Spendable balance
    #[default]
    Current,
    /// Points earned, lifetime or within a period
    Total,
}

/// Trailing window for `LeaderboardType::Total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    AllTime,
    Week,
    Month,
    Year,
}

impl Period {
    /// Start of the trailing window ending at `now`; `None` for all time
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::AllTime => None,
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Year => now.checked_sub_months(Months::new(12)),
        }
    }
}

/// Where leaderboard points come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    CurrentPoints,
    TotalPoints,
    /// Sum of completion credits at or after the instant
    EarnedSince(DateTime<Utc>),
}

impl ScoreSource {
    /// `type=current` ignores the period
    pub fn resolve(kind: LeaderboardType, period: Period, now: DateTime<Utc>) -> Self {
        match kind {
            LeaderboardType::Current => ScoreSource::CurrentPoints,
            LeaderboardType::Total => match period.window_start(now) {
                Some(since) => ScoreSource::EarnedSince(since),
                None => ScoreSource::TotalPoints,
            },
        }
    }
}

/// Validated pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: usize,
    offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// limit は 1..=100（省略時 10）、offset は 0 以上
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> PointsResult<Self> {
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(PointsError::Validation(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(PointsError::Validation(
                "offset must not be negative".to_string(),
            ));
        }
        Ok(Self {
            limit: limit as usize,
            offset: offset as usize,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT as usize,
            offset: 0,
        }
    }
}

/// Inactivity threshold in calendar months (>= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthsThreshold(u32);

impl MonthsThreshold {
    pub fn new(months: i64) -> PointsResult<Self> {
        match u32::try_from(months) {
            Ok(m) if m >= 1 => Ok(Self(m)),
            _ => Err(PointsError::Validation(
                "monthsThreshold must be a positive number of months".to_string(),
            )),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_page_bounds() {
        assert_eq!(Page::new(None, None).unwrap(), Page::default());
        assert!(Page::new(Some(1), Some(0)).is_ok());
        assert!(Page::new(Some(100), Some(5)).is_ok());
        assert!(matches!(
            Page::new(Some(0), None),
            Err(PointsError::Validation(_))
        ));
        assert!(matches!(
            Page::new(Some(101), None),
            Err(PointsError::Validation(_))
        ));
        assert!(matches!(
            Page::new(None, Some(-1)),
            Err(PointsError::Validation(_))
        ));
    }

    #[test]
    fn test_score_source_resolution() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();

        assert_eq!(
            ScoreSource::resolve(LeaderboardType::Current, Period::Year, now),
            ScoreSource::CurrentPoints
        );
        assert_eq!(
            ScoreSource::resolve(LeaderboardType::Total, Period::AllTime, now),
            ScoreSource::TotalPoints
        );
        // Month arithmetic clamps to the last day of February
        assert_eq!(
            ScoreSource::resolve(LeaderboardType::Total, Period::Month, now),
            ScoreSource::EarnedSince(Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_months_threshold() {
        assert_eq!(MonthsThreshold::new(6).unwrap().get(), 6);
        assert!(MonthsThreshold::new(0).is_err());
        assert!(MonthsThreshold::new(-3).is_err());
    }

    #[test]
    fn test_transaction_kind_round_trip() {
        for kind in [TransactionKind::Completion, TransactionKind::Redemption] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("refund".parse::<TransactionKind>().is_err());
    }
}
