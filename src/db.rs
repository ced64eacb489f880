// src/db.rs

use crate::error::{EcoError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key holding the JSON array of log entries.
pub const LOG_KEY: &str = "pesticideLog";
/// Key holding the ISO-8601 time of the last pesticide application.
pub const LAST_APPLICATION_KEY: &str = "lastPesticideApplication";
/// Key holding the before/after pest counts.
pub const PEST_COUNT_KEY: &str = "pestCountData";
/// Key holding `"light"`, `"dark"` or `"system"`.
pub const THEME_KEY: &str = "theme";
/// Key holding the signed-in identity record.
pub const USER_KEY: &str = "signedInUser";

/// Default database location (~/.config/ecoslug/ecoslug.db).
pub fn default_db_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(EcoError::HomeDirNotFound)?;
    Ok(home_dir.join(".config/ecoslug/ecoslug.db"))
}

/// Durable key-value storage scoped to one user, backed by a single SQLite
/// table. Writes to different keys are independent.
pub struct Medium {
    conn: Connection,
}

impl Medium {
    /// Opens the store at `path`, creating the directory and table if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %path.display(), "opening storage");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Like [`get_item`](Self::get_item), but a read error is logged and
    /// reads as absent.
    pub fn get_item_or_warn(&self, key: &str) -> Option<String> {
        match self.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "could not read stored item");
                None
            }
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        debug!(key, bytes = value.len(), "stored item");
        Ok(())
    }

    /// Returns whether the key existed.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM storage WHERE key = ?", [key])?;
        Ok(count > 0)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM storage ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
