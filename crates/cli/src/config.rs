use std::time::Duration;

use rowseed_db::ConnectionSettings;

/// Configuration problems detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Loader configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub db: ConnectionSettings,
}

impl LoaderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default     |
    /// |---------------------------|-------------|
    /// | `DB_HOST`                 | `localhost` |
    /// | `DB_PORT`                 | `5432`      |
    /// | `DB_USER`                 | `postgres`  |
    /// | `DB_PASSWORD`             | (empty)     |
    /// | `DB_NAME`                 | `schools`   |
    /// | `DB_CONNECT_TIMEOUT_SECS` | `10`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.into());

        let port_raw = var("DB_PORT", "5432");
        let port: u16 = port_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "DB_PORT",
            expected: "a port number (1-65535)",
            value: port_raw.clone(),
        })?;
        if port == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_PORT",
                expected: "a port number (1-65535)",
                value: port_raw,
            });
        }

        let timeout_raw = var("DB_CONNECT_TIMEOUT_SECS", "10");
        let connect_timeout_secs: u64 = timeout_raw
            .trim()
            .parse()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ConfigError::Invalid {
                var: "DB_CONNECT_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: timeout_raw.clone(),
            })?;

        Ok(Self {
            db: ConnectionSettings {
                host: var("DB_HOST", "localhost"),
                port,
                user: var("DB_USER", "postgres"),
                password: var("DB_PASSWORD", ""),
                database: var("DB_NAME", "schools"),
                connect_timeout: Duration::from_secs(connect_timeout_secs),
            },
        })
    }
}
