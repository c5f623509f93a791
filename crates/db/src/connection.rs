//! Opening and closing the run's session.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

use rowseed_core::store::ConnectionProvider;
use rowseed_core::StoreError;

use crate::error::connect_error;
use crate::session::PgSession;

/// Where and how to connect.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .application_name("rowseed");
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Opens one [`PgSession`] per run. A single attempt, bounded by a timeout.
pub struct PgConnectionProvider {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgConnectionProvider {
    pub fn new(settings: &ConnectionSettings) -> Self {
        Self::from_options(settings.connect_options(), settings.connect_timeout)
    }

    pub fn from_options(options: PgConnectOptions, connect_timeout: Duration) -> Self {
        Self {
            options,
            connect_timeout,
        }
    }
}

#[async_trait]
impl ConnectionProvider for PgConnectionProvider {
    type Session = PgSession;

    async fn acquire(&self) -> Result<PgSession, StoreError> {
        let connect = PgConnection::connect_with(&self.options);
        let conn = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to connect to database");
                return Err(connect_error(&e));
            }
            Err(_) => {
                tracing::error!(timeout = ?self.connect_timeout, "Timed out connecting to database");
                return Err(StoreError::Connection(format!(
                    "timed out after {}s",
                    self.connect_timeout.as_secs()
                )));
            }
        };
        tracing::info!(
            host = self.options.get_host(),
            port = self.options.get_port(),
            database = self.options.get_database().unwrap_or_default(),
            "Database session opened"
        );
        Ok(PgSession::new(conn))
    }

    async fn release(&self, session: PgSession) {
        match session.into_inner().close().await {
            Ok(()) => tracing::info!("Database session closed"),
            Err(e) => tracing::warn!(error = %e, "Database session did not close cleanly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            host: "db.internal".into(),
            port: 6543,
            user: "loader".into(),
            password: "hunter2".into(),
            database: "schools".into(),
            connect_timeout: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_connect_options_carry_settings() {
        let options = settings().connect_options();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "loader");
        assert_eq!(options.get_database(), Some("schools"));
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
