use rusqlite::{Connection, Result};
use std::path::PathBuf;

pub mod store;

pub use store::{keys, load, save, MemoryStore, SessionStore, SqliteStore, STORE_NAMESPACE};

fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\User".to_string());
        PathBuf::from(home).join(".local\\share\\learning-modes")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
        PathBuf::from(home).join(".local/share/learning-modes")
    }
}

pub fn get_db_path() -> PathBuf {
    get_data_dir().join("session.db")
}

pub(crate) fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_entries (
            namespace TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (namespace, key)
        )",
        [],
    )?;

    Ok(())
}
