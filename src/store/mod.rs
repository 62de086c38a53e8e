//! Schemaless document store behind the record gateways.
//!
//! Collections hold JSON objects keyed by a store-generated id. The store
//! offers per-document atomicity only; there are no cross-document
//! transactions.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{BackendKind, Config};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("documents must be JSON objects")]
    NotAnObject,

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored document with its id
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter plus optional ordering, both on dotted field paths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((path.into(), value.into()));
        self
    }

    pub fn order_by(mut self, path: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((path.into(), direction));
        self
    }

    /// Apply filter and ordering to an unordered set of documents
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| match &self.filter {
                Some((path, expected)) => lookup(&doc.data, path) == Some(expected),
                None => true,
            })
            .collect();

        if let Some((path, direction)) = &self.order_by {
            matched.sort_by(|a, b| {
                let ord = compare_values(lookup(&a.data, path), lookup(&b.data, path));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        matched
    }
}

/// Resolve a dotted path such as `jobInfo.hierarchyLevel`
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Missing values sort last; RFC 3339 strings compare as instants
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.to_lowercase().cmp(&y.to_lowercase()),
        },
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn parse_instant(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Shallow merge: top-level keys of `patch` replace those of `target`
pub(crate) fn merge_top_level(target: &mut Value, patch: Value) -> Result<(), StoreError> {
    let Value::Object(patch) = patch else {
        return Err(StoreError::NotAnObject);
    };
    let target = target.as_object_mut().ok_or(StoreError::NotAnObject)?;
    for (key, value) in patch {
        target.insert(key, value);
    }
    Ok(())
}

pub(crate) fn ensure_object(data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) type Collection = Map<String, Value>;

/// Document database collaborator
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated id
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merge top-level fields into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Remove a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

/// Build the store selected by `backend.kind`
pub fn open_store(config: &Config) -> Arc<dyn DocumentStore> {
    match config.backend.kind {
        BackendKind::Memory => {
            tracing::info!("using in-memory document store");
            Arc::new(MemoryStore::new())
        }
        BackendKind::Json => {
            let dir = config.data_path().join("documents");
            tracing::info!(path = %dir.display(), "using JSON file document store");
            Arc::new(JsonFileStore::new(dir))
        }
    }
}
