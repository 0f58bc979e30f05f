use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub const KEY_ROWS: &str = "eth_addresses_data";
pub const KEY_TITLE: &str = "eth_page_title";
pub const KEY_PAGE_SIZE: &str = "eth_page_size";
pub const KEY_CURRENT_PAGE: &str = "eth_current_page";

/// Durable string slots keyed by name
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store, used when the database cannot be opened
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_overwrites_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get(KEY_TITLE).unwrap(), None);
        store.set(KEY_TITLE, "Cold storage").unwrap();
        store.set(KEY_TITLE, "Hot wallets").unwrap();
        assert_eq!(store.get(KEY_TITLE).unwrap().as_deref(), Some("Hot wallets"));
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.sqlite3");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set(KEY_PAGE_SIZE, "20").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_PAGE_SIZE).unwrap().as_deref(), Some("20"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set(KEY_CURRENT_PAGE, "3").unwrap();
        assert_eq!(store.get(KEY_CURRENT_PAGE).unwrap().as_deref(), Some("3"));
        assert_eq!(store.get(KEY_ROWS).unwrap(), None);
    }
}
