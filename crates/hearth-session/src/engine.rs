//! Embedded ordered key-value engine.
//!
//! A thin layer over SQLite that provides what the session connection needs
//! from its storage:
//!
//! - read-only (`view`) and read-write (`update`) transactions
//! - string keys kept in sorted order, with prefix iteration
//! - per-key TTL; expired entries are invisible to reads and are swept at the
//!   start of every write transaction
//!
//! The special location [`MEMORY`] opens a private in-memory database.

use std::ops::Deref;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, trace};

/// Location alias for an in-memory engine.
pub const MEMORY: &str = ":memory:";

/// How long a writer waits for a file lock held by another handle.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors reported by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The key does not exist or has expired.
    #[error("not found")]
    NotFound,

    /// The engine handle could not be released.
    #[error(transparent)]
    Close(rusqlite::Error),

    /// Underlying SQLite failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Options for [`WriteTx::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Whether the entry expires at all.
    pub expires: bool,
    /// Time to live, counted from the start of the transaction.
    pub ttl: Duration,
}

impl SetOptions {
    /// Options for an entry that expires after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { expires: true, ttl }
    }
}

/// Handle to an open engine.
///
/// Transactions are serialized through an internal lock, so a single handle
/// can be shared freely between threads.
pub struct Engine {
    conn: Mutex<Connection>,
    path: String,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open or create an engine at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == MEMORY {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn
        };

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                expires_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_kv_expires_at
                ON kv(expires_at) WHERE expires_at IS NOT NULL;
            "#,
        )?;

        debug!(path = %path, "Engine opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_string(),
        })
    }

    /// Location this engine was opened at.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Release the handle.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, e)| EngineError::Close(e))?;
        debug!(path = %path, "Engine closed");
        Ok(())
    }

    /// Run `f` inside a read-only transaction.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTx<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&ReadTx {
            conn: &tx,
            now: now_millis(),
        })?;
        tx.commit()?;
        Ok(out)
    }

    /// Run `f` inside a read-write transaction.
    ///
    /// Changes are committed when `f` returns `Ok` and rolled back otherwise.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&WriteTx<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now_millis();

        let swept = tx.execute(
            "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now],
        )?;
        if swept > 0 {
            trace!(swept, "Evicted expired entries");
        }

        let out = f(&WriteTx {
            read: ReadTx { conn: &tx, now },
        })?;
        tx.commit()?;
        Ok(out)
    }
}

/// Read access within a transaction.
pub struct ReadTx<'a> {
    conn: &'a Connection,
    now: i64,
}

impl ReadTx<'_> {
    /// Fetch the value at `key`, or [`EngineError::NotFound`].
    pub fn get(&self, key: &str) -> Result<String> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, self.now],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(EngineError::NotFound)
    }

    /// Remaining time to live for `key`; `None` when the entry never expires.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let expires_at: Option<i64> = self
            .conn
            .query_row(
                "SELECT expires_at FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, self.now],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(EngineError::NotFound)?;

        Ok(expires_at.map(|at| Duration::from_millis((at - self.now).max(0) as u64)))
    }

    /// Visit live entries whose key starts with `prefix`, in ascending key
    /// order, until `visit` returns `false`.
    pub fn ascend_keys<F>(&self, prefix: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT key, value FROM kv
            WHERE key >= ?1 AND (expires_at IS NULL OR expires_at > ?2)
            ORDER BY key
            "#,
        )?;
        let mut rows = stmt.query(params![prefix, self.now])?;

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            if !key.starts_with(prefix) {
                break;
            }
            let value: String = row.get(1)?;
            if !visit(&key, &value) {
                break;
            }
        }

        Ok(())
    }
}

/// Read-write access within a transaction.
pub struct WriteTx<'a> {
    read: ReadTx<'a>,
}

impl<'a> Deref for WriteTx<'a> {
    type Target = ReadTx<'a>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl WriteTx<'_> {
    /// Store `value` at `key`, returning the live value it replaced.
    pub fn set(&self, key: &str, value: &str, opts: SetOptions) -> Result<Option<String>> {
        let previous = match self.get(key) {
            Ok(v) => Some(v),
            Err(EngineError::NotFound) => None,
            Err(e) => return Err(e),
        };

        let expires_at = opts.expires.then(|| {
            let ttl = i64::try_from(opts.ttl.as_millis()).unwrap_or(i64::MAX);
            self.now.saturating_add(ttl)
        });

        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
            params![key, value, expires_at],
        )?;

        Ok(previous)
    }

    /// Remove `key`, returning its value, or [`EngineError::NotFound`].
    pub fn delete(&self, key: &str) -> Result<String> {
        let value = self.get(key)?;
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(value)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn memory() -> Engine {
        Engine::open(MEMORY).unwrap()
    }

    fn put(engine: &Engine, key: &str, value: &str) {
        engine
            .update(|tx| tx.set(key, value, SetOptions::default()))
            .unwrap();
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let engine = memory();
        let result = engine.view(|tx| tx.get("nope"));
        assert!(matches!(result, Err(EngineError::NotFound)));
    }

    #[test]
    fn test_set_returns_previous_value() {
        let engine = memory();
        let first = engine
            .update(|tx| tx.set("k", "one", SetOptions::default()))
            .unwrap();
        assert_eq!(first, None);

        let second = engine
            .update(|tx| tx.set("k", "two", SetOptions::default()))
            .unwrap();
        assert_eq!(second.as_deref(), Some("one"));
        assert_eq!(engine.view(|tx| tx.get("k")).unwrap(), "two");
    }

    #[test]
    fn test_ttl_expiry_hides_entry() {
        let engine = memory();
        engine
            .update(|tx| tx.set("k", "v", SetOptions::with_ttl(Duration::from_millis(300))))
            .unwrap();
        assert_eq!(engine.view(|tx| tx.get("k")).unwrap(), "v");

        thread::sleep(Duration::from_millis(450));

        assert!(matches!(
            engine.view(|tx| tx.get("k")),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn test_ttl_reports_remaining_time() {
        let engine = memory();
        engine
            .update(|tx| {
                tx.set("short", "v", SetOptions::with_ttl(Duration::from_secs(60)))?;
                tx.set("forever", "v", SetOptions::default())
            })
            .unwrap();

        let remaining = engine.view(|tx| tx.ttl("short")).unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(50));
        assert_eq!(engine.view(|tx| tx.ttl("forever")).unwrap(), None);
    }

    #[test]
    fn test_update_sweeps_expired_rows() {
        let engine = memory();
        engine
            .update(|tx| tx.set("old", "v", SetOptions::with_ttl(Duration::from_millis(10))))
            .unwrap();
        thread::sleep(Duration::from_millis(30));

        put(&engine, "new", "v");

        let rows: i64 = engine
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_ascend_keys_in_order_within_prefix() {
        let engine = memory();
        for key in ["user:2", "user:10", "admin:1", "user:1", "users", "v"] {
            put(&engine, key, key);
        }

        let mut seen = Vec::new();
        engine
            .view(|tx| {
                tx.ascend_keys("user:", |key, _| {
                    seen.push(key.to_string());
                    true
                })
            })
            .unwrap();

        assert_eq!(seen, vec!["user:1", "user:10", "user:2"]);
    }

    #[test]
    fn test_ascend_keys_empty_prefix_visits_everything() {
        let engine = memory();
        for key in ["b", "a", "c"] {
            put(&engine, key, key);
        }

        let mut seen = Vec::new();
        engine
            .view(|tx| {
                tx.ascend_keys("", |key, value| {
                    assert_eq!(key, value);
                    seen.push(key.to_string());
                    true
                })
            })
            .unwrap();

        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ascend_keys_stops_when_visitor_returns_false() {
        let engine = memory();
        for key in ["p:1", "p:2", "p:3"] {
            put(&engine, key, key);
        }

        let mut count = 0;
        engine
            .view(|tx| {
                tx.ascend_keys("p:", |_, _| {
                    count += 1;
                    count < 2
                })
            })
            .unwrap();

        assert_eq!(count, 2);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let engine = memory();
        assert!(matches!(
            engine.update(|tx| tx.delete("nope")),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let engine = memory();
        put(&engine, "keep", "v");

        let result: Result<()> = engine.update(|tx| {
            tx.delete("keep")?;
            tx.delete("missing")?;
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::NotFound)));

        assert_eq!(engine.view(|tx| tx.get("keep")).unwrap(), "v");
    }

    #[test]
    fn test_file_engine_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let path = path.to_str().unwrap();

        let engine = Engine::open(path).unwrap();
        put(&engine, "k", "v");
        engine.close().unwrap();

        let engine = Engine::open(path).unwrap();
        assert_eq!(engine.view(|tx| tx.get("k")).unwrap(), "v");
        assert_eq!(engine.path(), path);
    }

    #[test]
    fn test_close_error_reads_as_sqlite_error() {
        let expected = rusqlite::Error::InvalidQuery.to_string();
        let err = EngineError::Close(rusqlite::Error::InvalidQuery);

        assert_eq!(err.to_string(), expected);
        assert_eq!(
            std::error::Error::source(&err).map(|e| e.to_string()),
            std::error::Error::source(&rusqlite::Error::InvalidQuery).map(|e| e.to_string())
        );
    }
}
