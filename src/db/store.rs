use crate::db::run_migrations;
use crate::error::StoreResult;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

pub const STORE_NAMESPACE: &str = "question-storage";

pub mod keys {
    pub const TITLE: &str = "title";
    pub const SOURCE_DOCUMENT: &str = "source_document";
    pub const ITEMS: &str = "items";
    pub const SELECTED_MODE: &str = "selected_mode";
}

/// String key-value store scoped to one learning session.
pub trait SessionStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

pub fn load<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save<T: Serialize + ?Sized>(store: &mut dyn SessionStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    namespace: String,
}

impl SqliteStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn,
            namespace: STORE_NAMESPACE.to_string(),
        })
    }

    pub fn open_default() -> StoreResult<Self> {
        Self::open(&crate::db::get_db_path())
    }
}

impl SessionStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM session_entries WHERE namespace = ? AND key = ?",
                rusqlite::params![self.namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let updated_at = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO session_entries (namespace, key, value, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![self.namespace, key, value, updated_at],
        )?;
        Ok(())
    }
}
