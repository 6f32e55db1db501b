//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::PaymentTypeId;
use domain::LifecycleConfig;
use statistics::MonthWindow;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs in memory
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `DELIVERY_PAYMENT_TYPE_ID`: payment type that needs an address (default: `1`)
/// - `NOTIFY_TIMEOUT_MS`: cap on the operator push (default: `500`)
/// - `STATS_MONTH_WINDOW`: `calendar` or `legacy-day31` (default: `calendar`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub delivery_payment_type_id: i64,
    pub notify_timeout_ms: u64,
    pub stats_month_window: MonthWindow,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            delivery_payment_type_id: env_or(
                "DELIVERY_PAYMENT_TYPE_ID",
                defaults.delivery_payment_type_id,
            ),
            notify_timeout_ms: env_or("NOTIFY_TIMEOUT_MS", defaults.notify_timeout_ms),
            stats_month_window: env_or("STATS_MONTH_WINDOW", defaults.stats_month_window),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            delivery_payment_type: PaymentTypeId::new(self.delivery_payment_type_id),
            notify_timeout: Duration::from_millis(self.notify_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            delivery_payment_type_id: 1,
            notify_timeout_ms: 500,
            stats_month_window: MonthWindow::Calendar,
        }
    }
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
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.stats_month_window, MonthWindow::Calendar);
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
    fn test_lifecycle_config() {
        let config = Config {
            delivery_payment_type_id: 3,
            notify_timeout_ms: 250,
            ..Config::default()
        };
        let lifecycle = config.lifecycle();
        assert_eq!(lifecycle.delivery_payment_type, PaymentTypeId::new(3));
        assert_eq!(lifecycle.notify_timeout, Duration::from_millis(250));
    }
}
