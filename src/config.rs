use std::time::Duration;

use serde::Deserialize;

/// How the ledger guards a contract's balance during a delivery mutation
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerLockStrategy {
    /// Contract row is read with `SELECT ... FOR UPDATE` for the whole transaction
    #[default]
    RowLock,
    /// Contract row is read without a lock; the balance write is a guarded
    /// `UPDATE ... WHERE remaining_eggs - $delta >= 0` checked by affected rows
    ConditionalUpdate,
}

/// Process-wide settings, resolved once at startup and shared read-only.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub ledger_lock_strategy: LedgerLockStrategy,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors_origins"),
        )
    }

    pub(crate) fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .set_default("database_url", "postgresql://localhost/henhouse")?
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("cors_origins", vec!["*"])?
            .set_default("db_max_connections", 20)?
            .set_default("db_acquire_timeout_secs", 30)?
            .set_default("request_timeout_secs", 30)?
            .set_default("ledger_lock_strategy", "row_lock")?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}
