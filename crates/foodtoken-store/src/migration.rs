//! Database schema migrations for SQLite.
//!
//! Simple versioned migration system: each migration transforms the schema
//! from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per unique student. Display casing lives in email/usn;
        -- the *_norm columns carry the folded comparison form.
        CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            email_norm TEXT NOT NULL DEFAULT '',
            usn TEXT NOT NULL DEFAULT '',
            usn_norm TEXT NOT NULL DEFAULT '',
            class_name TEXT NOT NULL DEFAULT '',
            food_preference TEXT NOT NULL CHECK(food_preference IN ('veg', 'non-veg')),
            token TEXT NOT NULL UNIQUE,
            credential_path TEXT,
            state INTEGER NOT NULL DEFAULT 0,    -- 0=issued, 1=redeemed
            redeemed_at INTEGER,                 -- set iff state=1 (Unix ms)
            created_at INTEGER NOT NULL,         -- Unix ms

            UNIQUE(email_norm, usn_norm)
        );

        -- Audit trail: one row per successful redemption.
        CREATE TABLE redemptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id INTEGER NOT NULL,
            redeemed_at INTEGER NOT NULL,
            scanner_info TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (entry_id) REFERENCES entries (id)
        );

        -- Indexes for the identity-collision check and fallback lookup
        CREATE INDEX idx_entries_email_norm ON entries(email_norm);
        CREATE INDEX idx_entries_usn_norm ON entries(usn_norm);
        CREATE INDEX idx_entries_state ON entries(state);
        CREATE INDEX idx_redemptions_entry ON redemptions(entry_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
