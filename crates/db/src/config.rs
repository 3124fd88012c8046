//! Environment-driven configuration for the category store.

use hearth_core::category::DEFAULT_MAX_HIERARCHY_DEPTH;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// How long to wait for a pooled connection, in seconds (default: `5`).
    pub acquire_timeout_secs: u64,
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `DATABASE_URL`            | (required) |
    /// | `DB_MAX_CONNECTIONS`      | `20`       |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        })
    }
}

/// Limits applied by the hierarchy walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Maximum parent hops between any category and its root.
    pub max_depth: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

impl HierarchyConfig {
    /// | Env Var              | Default |
    /// |----------------------|---------|
    /// | `CATEGORY_MAX_DEPTH` | `10`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_depth = parse_var("CATEGORY_MAX_DEPTH", DEFAULT_MAX_HIERARCHY_DEPTH)?;
        Self::new(max_depth)
    }

    pub fn new(max_depth: usize) -> Result<Self, ConfigError> {
        if max_depth == 0 {
            return Err(ConfigError::Invalid {
                var: "CATEGORY_MAX_DEPTH",
                value: max_depth.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { max_depth })
    }
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
