//! Key-value blob store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist whole serialized collections under a small set of logical keys.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Writes replace the whole value for a key; there are no partial updates.
//! - A missing key reads as `None`, never as an error.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Logical key holding the serialized alarm list.
pub const ALARMS_KEY: &str = "alarms";
/// Logical key holding the serialized to-do task list.
pub const TASKS_KEY: &str = "tasks";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Encode {
        key: String,
        source: serde_json::Error,
    },
    Decode {
        key: String,
        source: serde_json::Error,
    },
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::Decode { key, source } => write!(f, "failed to decode `{key}`: {source}"),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(source),
            Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Opaque string store with full-overwrite semantics.
pub trait KvStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// Reads and decodes a JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StoreResult<Option<T>> {
    let Some(raw) = store.read(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
}

/// Entries decoded from a stored JSON array.
#[derive(Debug)]
pub struct LoadedList<T> {
    pub items: Vec<T>,
    /// Position and decode error of every entry that was skipped.
    pub rejected: Vec<(usize, serde_json::Error)>,
}

impl<T> Default for LoadedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Reads a JSON array under `key` and decodes each entry on its own.
///
/// One bad entry does not discard its neighbours. Only a value that is not a
/// JSON array at all is reported as `Decode`.
pub fn load_json_list<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> StoreResult<LoadedList<T>> {
    let Some(values) = load_json::<Vec<serde_json::Value>>(store, key)? else {
        return Ok(LoadedList::default());
    };
    let mut loaded = LoadedList::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => loaded.items.push(item),
            Err(err) => loaded.rejected.push((index, err)),
        }
    }
    Ok(loaded)
}

/// Encodes `value` as JSON and overwrites `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)
}

/// SQLite-backed key-value store.
///
/// Cloning shares the same connection, so the alarm registry and the to-do
/// list can write through one database handle.
#[derive(Clone)]
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Returns every stored key in ascending order.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{load_json, load_json_list, save_json, KvStore, SqliteKvStore, StoreError};
    use crate::db::open_db_in_memory;

    fn store() -> SqliteKvStore {
        SqliteKvStore::new(open_db_in_memory().unwrap())
    }

    #[test]
    fn missing_key_reads_as_none() {
        assert_eq!(store().read("alarms").unwrap(), None);
    }

    #[test]
    fn write_overwrites_previous_value() {
        let store = store();
        store.write("tasks", "[1]").unwrap();
        store.write("tasks", "[1,2]").unwrap();
        assert_eq!(store.read("tasks").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(store.keys().unwrap(), vec!["tasks".to_string()]);
    }

    #[test]
    fn clones_share_one_connection() {
        let first = store();
        let second = first.clone();
        first.write("alarms", "[]").unwrap();
        assert_eq!(second.read("alarms").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn load_json_reports_decode_errors_with_key() {
        let store = store();
        store.write("alarms", "{not json").unwrap();
        let err = load_json::<Vec<String>>(&store, "alarms").unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref key, .. } if key == "alarms"));
    }

    #[test]
    fn save_then_load_json() {
        let store = store();
        save_json(&store, "tasks", &vec!["a", "b"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&store, "tasks").unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn load_json_list_skips_only_bad_entries() {
        let store = store();
        store.write("tasks", r#"["a", 7, "b", null]"#).unwrap();
        let loaded = load_json_list::<String>(&store, "tasks").unwrap();
        assert_eq!(loaded.items, vec!["a".to_string(), "b".to_string()]);
        let positions: Vec<usize> = loaded.rejected.iter().map(|(index, _)| *index).collect();
        assert_eq!(positions, vec![1, 3]);

        store.write("tasks", r#"{"not": "a list"}"#).unwrap();
        assert!(matches!(
            load_json_list::<String>(&store, "tasks"),
            Err(StoreError::Decode { .. })
        ));
    }
}
