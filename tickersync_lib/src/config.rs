//! Process-wide configuration, read once from the environment at start-up.
//!
//! Nothing else in the crate looks at environment variables: the binary
//! builds an [`AppConfig`] and passes it by reference to the fetcher and
//! the sinks.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::validation;

pub const API_KEY_VAR: &str = "POLYGON_API_KEY";
pub const BASE_URL_VAR: &str = "POLYGON_BASE_URL";
pub const PAGE_LIMIT_VAR: &str = "TICKERS_PAGE_LIMIT";
pub const PAGE_DELAY_VAR: &str = "TICKERS_PAGE_DELAY_MS";
pub const RATE_LIMIT_BACKOFF_VAR: &str = "TICKERS_RATE_LIMIT_BACKOFF_MS";
pub const RETRY_MAX_VAR: &str = "TICKERS_RETRY_MAX";
pub const RETRY_BASE_VAR: &str = "TICKERS_RETRY_BASE_MS";
pub const RETRY_CAP_VAR: &str = "TICKERS_RETRY_MAX_MS";
pub const WAREHOUSE_ACCOUNT_VAR: &str = "SNOWFLAKE_ACCOUNT";
pub const WAREHOUSE_USER_VAR: &str = "SNOWFLAKE_USER";
pub const WAREHOUSE_PASSWORD_VAR: &str = "SNOWFLAKE_PASSWORD";
pub const WAREHOUSE_NAME_VAR: &str = "SNOWFLAKE_WAREHOUSE";
pub const WAREHOUSE_ROLE_VAR: &str = "SNOWFLAKE_ROLE";
pub const WAREHOUSE_DATABASE_VAR: &str = "SNOWFLAKE_DATABASE";
pub const WAREHOUSE_SCHEMA_VAR: &str = "SNOWFLAKE_SCHEMA";
pub const WAREHOUSE_TABLE_VAR: &str = "SNOWFLAKE_TABLE";

/// Pause between consecutive page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(200);
/// Pause before the single retry of a rate-limited page.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_DATABASE: &str = "tickers.db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything a run needs, built once per process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub fetch: FetchSettings,
    /// `None` when no target table is configured; loading is then unavailable.
    pub warehouse: Option<WarehouseConfig>,
}

#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Pacing and retry knobs for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub limit: u32,
    pub page_delay: Duration,
    pub rate_limit_backoff: Duration,
    pub retry: RetryConfig,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            limit: validation::MAX_PAGE_LIMIT,
            page_delay: DEFAULT_PAGE_DELAY,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff for transport failures (network errors, 5xx, bad bodies).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryConfig {
    /// No retries and no waiting.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), with +/-20% jitter.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let base = base_ms.saturating_mul(exp).min(max_ms);
        if base == 0 {
            return Duration::ZERO;
        }
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

/// Connection parameters for the warehouse sink.
///
/// `database` names the database file. The account, user, role, warehouse
/// and schema identifiers describe the session and are reported when the
/// connection opens; the password is never logged.
///
/// `schema` is informational only. It is never used to qualify `table`, which
/// always lives in the main schema of the database file.
#[derive(Clone)]
pub struct WarehouseConfig {
    pub account: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub database: String,
    pub schema: Option<String>,
    pub table: String,
}

impl WarehouseConfig {
    /// Minimal config targeting `table` in the database file `database`.
    pub fn new(database: &str, table: &str) -> Result<Self, ConfigError> {
        let table = validation::validate_identifier(table).map_err(|e| ConfigError::Invalid {
            var: WAREHOUSE_TABLE_VAR,
            value: table.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            account: None,
            user: None,
            password: None,
            warehouse: None,
            role: None,
            database: database.to_string(),
            schema: None,
            table,
        })
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("table", &self.table)
            .finish()
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let base_url =
            get(BASE_URL_VAR).unwrap_or_else(|| tickers_api::DEFAULT_BASE_URL.to_string());

        let defaults = FetchSettings::default();
        let limit = match get(PAGE_LIMIT_VAR) {
            Some(raw) => {
                let parsed = parse_number::<u32>(PAGE_LIMIT_VAR, &raw)?;
                validation::validate_limit(parsed).map_err(|e| ConfigError::Invalid {
                    var: PAGE_LIMIT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?
            }
            None => defaults.limit,
        };
        let fetch = FetchSettings {
            limit,
            page_delay: millis_or(&get, PAGE_DELAY_VAR, defaults.page_delay)?,
            rate_limit_backoff: millis_or(
                &get,
                RATE_LIMIT_BACKOFF_VAR,
                defaults.rate_limit_backoff,
            )?,
            retry: RetryConfig {
                max_retries: match get(RETRY_MAX_VAR) {
                    Some(raw) => parse_number::<usize>(RETRY_MAX_VAR, &raw)?,
                    None => defaults.retry.max_retries,
                },
                base_delay: millis_or(&get, RETRY_BASE_VAR, defaults.retry.base_delay)?,
                max_delay: millis_or(&get, RETRY_CAP_VAR, defaults.retry.max_delay)?,
            },
        };

        let warehouse = match get(WAREHOUSE_TABLE_VAR) {
            Some(table) => {
                let database =
                    get(WAREHOUSE_DATABASE_VAR).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
                let mut config = WarehouseConfig::new(&database, &table)?;
                config.account = get(WAREHOUSE_ACCOUNT_VAR);
                config.user = get(WAREHOUSE_USER_VAR);
                config.password = get(WAREHOUSE_PASSWORD_VAR);
                config.warehouse = get(WAREHOUSE_NAME_VAR);
                config.role = get(WAREHOUSE_ROLE_VAR);
                config.schema = get(WAREHOUSE_SCHEMA_VAR);
                Some(config)
            }
            None => None,
        };

        Ok(Self {
            api: ApiConfig { api_key, base_url },
            fetch,
            warehouse,
        })
    }

    /// The warehouse config, or the error a load attempt should report.
    pub fn require_warehouse(&self) -> Result<&WarehouseConfig, ConfigError> {
        self.warehouse
            .as_ref()
            .ok_or(ConfigError::Missing(WAREHOUSE_TABLE_VAR))
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn millis_or<G>(get: &G, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => Ok(Duration::from_millis(parse_number::<u64>(var, &raw)?)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(API_KEY_VAR)));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "k")])).unwrap();
        assert_eq!(config.api.api_key, "k");
        assert_eq!(config.api.base_url, tickers_api::DEFAULT_BASE_URL);
        assert_eq!(config.fetch.limit, 1000);
        assert_eq!(config.fetch.page_delay, Duration::from_millis(200));
        assert_eq!(config.fetch.rate_limit_backoff, Duration::from_secs(5));
        assert_eq!(config.fetch.retry.max_retries, 3);
        assert!(config.warehouse.is_none());
        assert!(config.require_warehouse().is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (BASE_URL_VAR, "http://localhost:9000"),
            (PAGE_LIMIT_VAR, "250"),
            (PAGE_DELAY_VAR, "0"),
            (RATE_LIMIT_BACKOFF_VAR, "10"),
            (RETRY_MAX_VAR, "1"),
        ]))
        .unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.fetch.limit, 250);
        assert_eq!(config.fetch.page_delay, Duration::ZERO);
        assert_eq!(config.fetch.rate_limit_backoff, Duration::from_millis(10));
        assert_eq!(config.fetch.retry.max_retries, 1);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "k"), (PAGE_DELAY_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: PAGE_DELAY_VAR,
                ..
            }
        ));

        let err = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "k"), (PAGE_LIMIT_VAR, "5000")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: PAGE_LIMIT_VAR,
                ..
            }
        ));
    }

    #[test]
    fn warehouse_section_requires_table() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (WAREHOUSE_USER_VAR, "loader"),
            (WAREHOUSE_PASSWORD_VAR, "hunter2"),
        ]))
        .unwrap();
        assert!(config.warehouse.is_none());

        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (WAREHOUSE_USER_VAR, "loader"),
            (WAREHOUSE_PASSWORD_VAR, "hunter2"),
            (WAREHOUSE_ROLE_VAR, "LOADER"),
            (WAREHOUSE_TABLE_VAR, "RAW_TICKERS"),
        ]))
        .unwrap();
        let warehouse = config.require_warehouse().unwrap();
        assert_eq!(warehouse.table, "RAW_TICKERS");
        assert_eq!(warehouse.database, DEFAULT_DATABASE);
        assert_eq!(warehouse.user.as_deref(), Some("loader"));
        assert_eq!(warehouse.role.as_deref(), Some("LOADER"));
    }

    #[test]
    fn schema_does_not_qualify_the_table() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (WAREHOUSE_SCHEMA_VAR, "ANALYTICS"),
            (WAREHOUSE_TABLE_VAR, "RAW_TICKERS"),
        ]))
        .unwrap();
        let warehouse = config.require_warehouse().unwrap();
        assert_eq!(warehouse.schema.as_deref(), Some("ANALYTICS"));
        assert_eq!(warehouse.table, "RAW_TICKERS");
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "k"),
            (WAREHOUSE_TABLE_VAR, "tickers; drop table x"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: WAREHOUSE_TABLE_VAR,
                ..
            }
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "super-secret-key"),
            (WAREHOUSE_PASSWORD_VAR, "hunter2"),
            (WAREHOUSE_TABLE_VAR, "T"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn retry_delay_grows_and_caps() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        let first = retry.delay_for_attempt(1);
        assert!(first >= Duration::from_millis(80) && first <= Duration::from_millis(120));
        let capped = retry.delay_for_attempt(10);
        assert!(capped <= Duration::from_millis(360));
        assert_eq!(RetryConfig::disabled().delay_for_attempt(3), Duration::ZERO);
    }
}
