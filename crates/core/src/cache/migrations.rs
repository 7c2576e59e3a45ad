//! Schema versioning for the cache database.
//!
//! Applied versions are recorded in `schema_history`; each pending script
//! runs in its own transaction together with its history row.

use tokio_rusqlite::rusqlite::{self, Transaction};
use tokio_rusqlite::{Connection, params};

use super::Error;

/// Ordered schema scripts. Versions must be strictly increasing.
const SCRIPTS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_kv_store.sql"))];

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_history (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_history", [], |row| row.get(0))?;
    Ok(version)
}

fn apply(tx: &Transaction<'_>, version: i64, sql: &str) -> Result<(), Error> {
    tx.execute_batch(sql)
        .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
    tx.execute(
        "INSERT INTO schema_history (version, applied_at) VALUES (?1, ?2)",
        params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose script failed;
/// earlier versions stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = applied_version(conn)?;

        for &(version, sql) in SCRIPTS.iter().filter(|(version, _)| *version > current) {
            tracing::debug!(version, "applying cache schema version");
            let tx = conn.transaction()?;
            apply(&tx, version, sql)?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
