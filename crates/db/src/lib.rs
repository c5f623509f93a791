//! Postgres store for the loader.
//!
//! One [`PgSession`] wraps a single `PgConnection`; there is no pool because
//! a run is strictly sequential and owns its session exclusively.

pub mod connection;
pub mod error;
pub mod session;
pub mod sql;

pub use connection::{ConnectionSettings, PgConnectionProvider};
pub use session::PgSession;

/// Verify a connection is alive by running `SELECT 1`.
pub async fn health_check(conn: &mut sqlx::PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(conn).await?;
    Ok(())
}
