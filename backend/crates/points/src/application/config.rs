//! Application Configuration
//!
//! Configuration for the points application layer.

use std::time::Duration;

/// Points application configuration
#[derive(Debug, Clone)]
pub struct PointsConfig {
    /// Lock and statement timeout for ledger transactions
    pub store_timeout: Duration,
    /// Period of the background archive sweep
    pub archive_interval: Duration,
    /// Inactivity threshold used by the scheduler and the admin endpoint default
    pub archive_months_threshold: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5_000),
            archive_interval: Duration::from_secs(86_400),
            archive_months_threshold: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PointsConfig::default();
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.archive_interval, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.archive_months_threshold, 6);
    }
}
