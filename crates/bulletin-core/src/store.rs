//! Read-only key-value store seam.
//!
//! The bulletin only ever reads two logical tables: parameters keyed by
//! service date and order-of-worship skeletons keyed by outline id. The store
//! is injected into the parameter store and the resolver so tests can run
//! against [`MemoryStore`] while the CLI reads from a [`JsonDirStore`].

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Logical tables the bulletin reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Parameter records, keyed by service date.
    BulletinParams,
    /// Order-of-worship skeletons, keyed by outline id.
    OrderOfWorship,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::BulletinParams => "bulletin_params",
            Table::OrderOfWorship => "order_of_worship",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid key '{key}' for table {table}")]
    InvalidKey { table: Table, key: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only access to stored records.
pub trait KeyValueStore {
    /// Fetch one record. A missing record is `Ok(None)`, never an error.
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(table, key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(table, key)
    }
}

/// In-memory store for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<(Table, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: Table, key: impl Into<String>, record: Value) {
        self.records.insert((table, key.into()), record);
    }

    /// Builder-style [`MemoryStore::insert`].
    pub fn with(mut self, table: Table, key: impl Into<String>, record: Value) -> Self {
        self.insert(table, key, record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.records.get(&(table, key.to_string())).cloned())
    }
}

/// Directory-backed store: one JSON document per record at
/// `<root>/<table>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a record would be read from, after key validation.
    pub fn record_path(&self, table: Table, key: &str) -> Result<PathBuf, StoreError> {
        if !is_safe_key(key) {
            return Err(StoreError::InvalidKey {
                table,
                key: key.to_string(),
            });
        }
        Ok(self.root.join(table.name()).join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(table, key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(table = %table, key, path = %path.display(), "Record not found");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let record =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        debug!(table = %table, key, path = %path.display(), "Record loaded");
        Ok(Some(record))
    }
}

fn is_safe_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty()
        && trimmed == key
        && !key.contains(['/', '\\'])
        && !key.contains("..")
        && !key.starts_with('.')
}
