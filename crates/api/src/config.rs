//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use billing::{RetryPolicy, WorkflowSettings};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `BILL_DEFAULT_PERIOD_DAYS`: billing period when none is given (default: `30`)
/// - `CHARGE_MAX_ATTEMPTS`: attempts per item charge (default: `5`)
/// - `CHARGE_INITIAL_BACKOFF_SECS`: delay before the first retry (default: `3`)
/// - `CHARGE_MAX_BACKOFF_SECS`: cap for a single retry delay (default: `60`)
///
/// Values that fail to parse fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub default_period_days: i64,
    pub charge_max_attempts: u32,
    pub charge_initial_backoff_secs: u64,
    pub charge_max_backoff_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            default_period_days: env_or("BILL_DEFAULT_PERIOD_DAYS", defaults.default_period_days),
            charge_max_attempts: env_or("CHARGE_MAX_ATTEMPTS", defaults.charge_max_attempts),
            charge_initial_backoff_secs: env_or(
                "CHARGE_INITIAL_BACKOFF_SECS",
                defaults.charge_initial_backoff_secs,
            ),
            charge_max_backoff_secs: env_or(
                "CHARGE_MAX_BACKOFF_SECS",
                defaults.charge_max_backoff_secs,
            ),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the billing period applied when a bill is opened without an end.
    pub fn default_period(&self) -> chrono::Duration {
        chrono::Duration::days(self.default_period_days.max(1))
    }

    /// Builds the per-item charge retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .initial_backoff(Duration::from_secs(self.charge_initial_backoff_secs))
            .max_backoff(Duration::from_secs(self.charge_max_backoff_secs))
            .max_attempts(self.charge_max_attempts)
            .build()
    }

    /// Builds the settings every bill workflow starts with.
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings::default().with_retry(self.retry_policy())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            default_period_days: 30,
            charge_max_attempts: 5,
            charge_initial_backoff_secs: 3,
            charge_max_backoff_secs: 60,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_period_days, 30);
        assert_eq!(config.charge_max_attempts, 5);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_retry_policy_matches_billing_default() {
        let config = Config::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.workflow_settings(), WorkflowSettings::default());
    }

    #[test]
    fn test_custom_retry_policy() {
        let config = Config {
            charge_max_attempts: 2,
            charge_initial_backoff_secs: 1,
            charge_max_backoff_secs: 4,
            ..Config::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.max_backoff, Duration::from_secs(4));
    }

    #[test]
    fn test_default_period_is_at_least_one_day() {
        let config = Config {
            default_period_days: 0,
            ..Config::default()
        };
        assert_eq!(config.default_period(), chrono::Duration::days(1));
        assert_eq!(Config::default().default_period(), chrono::Duration::days(30));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("BILLING_TEST_SURELY_UNSET_VARIABLE", 7u32), 7);
    }
}
