//! Schema for the store and entry tables.
//!
//! `_migrations` records the highest applied version. Each step runs in its
//! own transaction together with its version row, so an interrupted upgrade
//! resumes at the first missing step on the next open.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// A numbered schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Applied in ascending version order.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "stores", sql: include_str!("../../migrations/001_stores.sql") },
    Migration { version: 2, name: "entries", sql: include_str!("../../migrations/002_entries.sql") },
];

/// Bring the schema to the latest version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the step whose SQL did not apply.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for step in MIGRATIONS.iter().filter(|m| m.version > current) {
            apply(conn, step)
                .map_err(|e| Error::MigrationFailed(format!("{:03}_{}: {e}", step.version, step.name)))?;
            tracing::debug!(version = step.version, name = step.name, "applied cache schema step");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn apply(conn: &rusqlite::Connection, step: &Migration) -> Result<(), rusqlite::Error> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(step.sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
        params![step.version, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()
}
