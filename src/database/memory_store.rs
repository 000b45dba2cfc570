//! Almacén de documentos en memoria
//!
//! Se usa en desarrollo (`STORAGE_BACKEND=memory`) y en los tests.
//! Mantiene el orden de inserción para devolver primero lo más reciente,
//! igual que la implementación PostgreSQL.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{parse_time, Collection, DocumentFilter, DocumentStore};
use crate::utils::errors::{AppError, AppResult};

struct StoredDocument {
    sequence: u64,
    data: Value,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(Collection, Uuid), StoredDocument>>,
    sequence: AtomicU64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&(collection, id)) {
            return Err(AppError::Conflict(format!(
                "Document '{}' already exists in {}",
                id, collection
            )));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        documents.insert((collection, id), StoredDocument { sequence, data: doc });
        Ok(())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> AppResult<Option<Value>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&(collection, id)).map(|d| d.data.clone()))
    }

    async fn find(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<Vec<Value>> {
        let documents = self.documents.read().await;

        let mut matches: Vec<&StoredDocument> = documents
            .iter()
            .filter(|((c, _), doc)| *c == collection && filter.matches(&doc.data))
            .map(|(_, doc)| doc)
            .collect();
        matches.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        if let Some(field) = filter.order_by_time {
            // Estable: a igual fecha se mantiene lo más reciente primero
            matches.sort_by_key(|doc| doc.data.get(field).and_then(parse_time));
        }

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        Ok(matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|doc| doc.data.clone())
            .collect())
    }

    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&(collection, id)) {
            Some(stored) => {
                stored.data = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> AppResult<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(&(collection, id)).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
