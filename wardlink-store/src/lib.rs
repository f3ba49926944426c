//! Durable key-value store for the Wardlink device agent.
//!
//! A small SQLite-backed string/bool store shared by the enrollment
//! workflow, the command loop, and the revocation guard. Writes are
//! individual atomic key upserts; the enrollment flags written through it
//! are monotonic, so no cross-key transaction is needed.

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Well-known store keys.
pub mod keys {
    /// The 10-character parent code.
    pub const PARENT_CODE: &str = "parent_code";
    /// The 4-digit secret code guarding admin revocation.
    pub const SECRET_CODE: &str = "secret_code";
    /// Stable device identity reported to the server.
    pub const DEVICE_IDENTITY: &str = "device_identity";
    /// Optional server base URL override.
    pub const SERVER_URL: &str = "server_url";
    /// Local lock-intent flag, cleared by UNLOCK_DEVICE.
    pub const LOCK_INTENT: &str = "lock_intent";

    // Enrollment flags, in workflow order.
    pub const CODE_VERIFIED: &str = "code_verified";
    pub const SECRET_CODE_SET: &str = "secret_code_set";
    pub const ADMIN_ENABLED: &str = "admin_enabled";
    pub const LOCATION_ENABLED: &str = "location_enabled";
    pub const REGISTERED: &str = "registered";
    pub const WORKFLOW_COMPLETED: &str = "workflow_completed";
}

/// SQLite-backed durable key-value store.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Storage(format!("failed to open store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        debug!("Opened store at {path}");
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("failed to open in-memory store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| StoreError::Storage(format!("failed to init store schema: {e}")))?;
        Ok(())
    }

    /// Returns the string value for a key, if present.
    pub fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| StoreError::Storage(format!("failed to read key {key}: {e}")))
    }

    /// Upserts a string value.
    pub fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| StoreError::Storage(format!("failed to write key {key}: {e}")))?;
        Ok(())
    }

    /// Returns the boolean value for a key; missing keys read as `false`.
    pub fn get_bool(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_string(key)?.as_deref() == Some("true"))
    }

    /// Upserts a boolean value.
    pub fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
    }

    /// Removes a key; removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| StoreError::Storage(format!("failed to remove key {key}: {e}")))?;
        Ok(())
    }
}
