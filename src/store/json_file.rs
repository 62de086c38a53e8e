//! Document store persisted as one JSON file per collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{
    ensure_object, merge_top_level, new_document_id, Collection, Document, DocumentStore, Query,
    StoreError,
};

/// File-backed store: `<dir>/<collection>.json` holds `{ id: document }`.
///
/// Writes go through a temp file and rename so a crash never leaves a
/// half-written collection behind.
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    async fn load(&self, collection: &str) -> Result<Collection, StoreError> {
        let path = self.collection_path(collection);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Ok(Collection::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collection::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, collection: &str, docs: &Collection) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(docs)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        ensure_object(&data)?;
        let _guard = self.write_lock.lock().await;
        let mut docs = self.load(collection).await?;
        let id = new_document_id();
        docs.insert(id.clone(), data);
        self.save(collection, &docs).await?;
        tracing::debug!(collection, id = %id, "document added");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let docs = self.load(collection).await?;
        Ok(docs.get(id).map(|data| Document {
            id: id.to_string(),
            data: data.clone(),
        }))
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.load(collection).await?;
        let doc = docs.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        merge_top_level(doc, patch)?;
        self.save(collection, &docs).await?;
        tracing::debug!(collection, id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.load(collection).await?;
        if docs.remove(id).is_some() {
            self.save(collection, &docs).await?;
            tracing::debug!(collection, id, "document deleted");
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let docs = self.load(collection).await?;
        Ok(query.apply(
            docs.into_iter()
                .map(|(id, data)| Document { id, data }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_documents_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let id = {
            let store = JsonFileStore::new(temp_dir.path());
            store.add("employees", json!({"name": "Ana"})).await.unwrap()
        };

        let store = JsonFileStore::new(temp_dir.path());
        let doc = store.get("employees", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Ana");
        assert!(temp_dir.path().join("employees.json").exists());
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("nested"));
        assert!(store.query("x", &Query::all()).await.unwrap().is_empty());
        assert!(store.get("x", "y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_query() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let a = store.add("d", json!({"name": "b"})).await.unwrap();
        store.add("d", json!({"name": "a"})).await.unwrap();

        store.update("d", &a, json!({"name": "c"})).await.unwrap();
        let docs = store
            .query("d", &Query::all().order_by("name", Direction::Ascending))
            .await
            .unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.data["name"].clone()).collect();
        assert_eq!(names, vec![json!("a"), json!("c")]);

        assert!(matches!(
            store.update("d", "missing", json!({})).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("d.json"), "{not json").unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        assert!(matches!(
            store.query("d", &Query::all()).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
