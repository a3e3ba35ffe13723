//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the token ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! Redemption and issuance both run as immediate transactions, so the
//! read-compare-write is atomic with respect to other processes sharing the
//! database file, not just other tasks in this process.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use foodtoken_core::{
    normalize, EntryId, FoodPreference, IdentityKey, LedgerEntry, Token, TokenState,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    DuplicateGroup, InsertOutcome, LedgerStats, NewEntry, RedeemKey, RedeemOutcome,
    RedemptionEvent, Store,
};

const ENTRY_COLUMNS: &str = "id, name, email, usn, class_name, food_preference, token, \
                             credential_path, state, redeemed_at, created_at";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

// Helper to convert a row (selected with ENTRY_COLUMNS) to a LedgerEntry.
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let token_str: String = row.get("token")?;
    let token = Token::parse(&token_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let food_str: String = row.get("food_preference")?;
    let food_preference = FoodPreference::from_db_str(&food_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown food preference: {}", food_str),
            )),
        )
    })?;

    let state_int: i64 = row.get("state")?;
    let state = TokenState::from_i64(state_int).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown state: {}", state_int),
            )),
        )
    })?;

    Ok(LedgerEntry {
        id: EntryId(row.get("id")?),
        name: row.get("name")?,
        email: row.get("email")?,
        usn: row.get("usn")?,
        class_name: row.get("class_name")?,
        food_preference,
        token,
        credential_path: row.get("credential_path")?,
        state,
        redeemed_at: row.get("redeemed_at")?,
        created_at: row.get("created_at")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_entry(&self, entry: &NewEntry) -> Result<InsertOutcome> {
        let entry = entry.clone();

        self.run(move |conn| {
            let email_norm = normalize::fold(&entry.email);
            let usn_norm = normalize::fold(&entry.usn);

            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Identity collision: non-empty email OR non-empty USN matches.
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM entries
                     WHERE (?1 <> '' AND email_norm = ?1)
                        OR (?2 <> '' AND usn_norm = ?2)
                     ORDER BY id LIMIT 1",
                    params![email_norm, usn_norm],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                return Ok(InsertOutcome::DuplicateIdentity {
                    existing: EntryId(id),
                });
            }

            tx.execute(
                "INSERT INTO entries (
                    name, email, email_norm, usn, usn_norm, class_name,
                    food_preference, token, state, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                params![
                    entry.name,
                    entry.email,
                    email_norm,
                    entry.usn,
                    usn_norm,
                    entry.class_name,
                    entry.food_preference.as_str(),
                    entry.token.as_string(),
                    entry.created_at,
                ],
            )?;

            let id = EntryId(tx.last_insert_rowid());
            tx.commit()?;

            debug!(id = id.0, token = %entry.token, "entry issued");

            Ok(InsertOutcome::Inserted(LedgerEntry {
                id,
                name: entry.name,
                email: entry.email,
                usn: entry.usn,
                class_name: entry.class_name,
                food_preference: entry.food_preference,
                token: entry.token,
                credential_path: None,
                state: TokenState::Issued,
                redeemed_at: None,
                created_at: entry.created_at,
            }))
        })
        .await
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                params![id.0],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_by_token(&self, token: &Token) -> Result<Option<LedgerEntry>> {
        let token = token.as_string();
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE token = ?1"),
                params![token],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_by_usn(&self, usn: &str) -> Result<Option<LedgerEntry>> {
        let usn_norm = normalize::fold(usn);
        // Entries without an enrollment id store usn_norm = ''; an empty
        // key must not match them.
        if usn_norm.is_empty() {
            return Ok(None);
        }
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE usn_norm = ?1"),
                params![usn_norm],
                row_to_entry,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY id"))?;
            let entries = stmt
                .query_map([], row_to_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }

    async fn identity_keys(&self) -> Result<Vec<IdentityKey>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare("SELECT email_norm, usn_norm FROM entries ORDER BY id")?;
            let keys = stmt
                .query_map([], |row| {
                    Ok(IdentityKey::from_parts(row.get(0)?, row.get(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(keys)
        })
        .await
    }

    async fn stats(&self) -> Result<LedgerStats> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT
                    COUNT(*),
                    SUM(CASE WHEN state = 0 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN state = 1 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN food_preference = 'veg' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN food_preference = 'non-veg' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN food_preference = 'veg' AND state = 1 THEN 1 ELSE 0 END),
                    SUM(CASE WHEN food_preference = 'non-veg' AND state = 1 THEN 1 ELSE 0 END)
                 FROM entries",
                [],
                |row| {
                    Ok(LedgerStats {
                        total: row.get::<_, i64>(0)? as u64,
                        issued: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                        redeemed: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as u64,
                        veg: row.get::<_, Option<i64>>(3)?.unwrap_or(0) as u64,
                        non_veg: row.get::<_, Option<i64>>(4)?.unwrap_or(0) as u64,
                        veg_redeemed: row.get::<_, Option<i64>>(5)?.unwrap_or(0) as u64,
                        non_veg_redeemed: row.get::<_, Option<i64>>(6)?.unwrap_or(0) as u64,
                    })
                },
            )
            .map_err(StoreError::from)
        })
        .await
    }

    async fn redeem(
        &self,
        key: &RedeemKey,
        redeemed_at: i64,
        scanner_info: &str,
    ) -> Result<RedeemOutcome> {
        let key = key.clone();
        let scanner_info = scanner_info.to_string();

        self.run(move |conn| {
            let (update_sql, select_sql, param) = match &key {
                RedeemKey::Token(token) => (
                    "UPDATE entries SET state = 1, redeemed_at = ?2
                     WHERE token = ?1 AND state = 0",
                    format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE token = ?1"),
                    token.as_string(),
                ),
                RedeemKey::Usn(usn) => (
                    "UPDATE entries SET state = 1, redeemed_at = ?2
                     WHERE usn_norm = ?1 AND state = 0",
                    format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE usn_norm = ?1"),
                    normalize::fold(usn),
                ),
            };

            // An empty folded key would hit every entry whose usn_norm is
            // '', updating them all in one statement.
            if param.is_empty() {
                return Ok(RedeemOutcome::NotFound);
            }

            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Conditional update: only an Issued row transitions. The
            // affected-row count decides between success and the two
            // failure modes.
            let changed = tx.execute(update_sql, params![param, redeemed_at])?;

            let entry = tx
                .query_row(&select_sql, params![param], row_to_entry)
                .optional()?;

            let outcome = match (changed, entry) {
                (1, Some(entry)) => {
                    tx.execute(
                        "INSERT INTO redemptions (entry_id, redeemed_at, scanner_info)
                         VALUES (?1, ?2, ?3)",
                        params![entry.id.0, redeemed_at, scanner_info],
                    )?;
                    debug!(id = entry.id.0, token = %entry.token, "token redeemed");
                    RedeemOutcome::Redeemed(entry)
                }
                (_, Some(entry)) => RedeemOutcome::AlreadyRedeemed(entry),
                (_, None) => RedeemOutcome::NotFound,
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn list_redemptions(&self, entry_id: Option<EntryId>) -> Result<Vec<RedemptionEvent>> {
        self.run(move |conn| {
            let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RedemptionEvent> {
                Ok(RedemptionEvent {
                    entry_id: EntryId(row.get(0)?),
                    redeemed_at: row.get(1)?,
                    scanner_info: row.get(2)?,
                })
            };

            let events = match entry_id {
                Some(id) => {
                    let mut stmt = conn.prepare(
                        "SELECT entry_id, redeemed_at, scanner_info FROM redemptions
                         WHERE entry_id = ?1 ORDER BY redeemed_at, id",
                    )?;
                    let rows = stmt.query_map(params![id.0], map_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT entry_id, redeemed_at, scanner_info FROM redemptions
                         ORDER BY redeemed_at, id",
                    )?;
                    let rows = stmt.query_map([], map_row)?;
                    rows.collect::<rusqlite::Result<Vec<_>>>()?
                }
            };

            Ok(events)
        })
        .await
    }

    async fn set_credential_path(&self, id: EntryId, path: &str) -> Result<bool> {
        let path = path.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE entries SET credential_path = ?2 WHERE id = ?1",
                params![id.0, path],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>> {
        self.run(move |conn| {
            let mut groups_stmt = conn.prepare(
                "SELECT name, email FROM entries
                 GROUP BY name, email HAVING COUNT(*) > 1
                 ORDER BY name, email",
            )?;
            let pairs: Vec<(String, String)> = groups_stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut ids_stmt =
                conn.prepare("SELECT id FROM entries WHERE name = ?1 AND email = ?2 ORDER BY id")?;

            let mut groups = Vec::with_capacity(pairs.len());
            for (name, email) in pairs {
                let ids: Vec<EntryId> = ids_stmt
                    .query_map(params![name, email], |row| Ok(EntryId(row.get(0)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                groups.push(DuplicateGroup { name, email, ids });
            }

            Ok(groups)
        })
        .await
    }

    async fn delete_entries(&self, ids: &[EntryId]) -> Result<usize> {
        let ids = ids.to_vec();
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut removed = 0;
            for id in &ids {
                tx.execute("DELETE FROM redemptions WHERE entry_id = ?1", params![id.0])?;
                removed += tx.execute("DELETE FROM entries WHERE id = ?1", params![id.0])?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    async fn clear_all(&self) -> Result<()> {
        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM redemptions", [])?;
            tx.execute("DELETE FROM entries", [])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
