use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{DocumentFilter, DocumentStore};
use crate::models::Document;
use crate::utils::errors::{not_found_error, AppResult};

/// Repositorio genérico: serializa el modelo a JSON y lo guarda en su colección
pub struct Repository<T: Document> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn create(&self, document: &T) -> AppResult<()> {
        let value = serde_json::to_value(document)?;
        self.store.insert(T::COLLECTION, document.id(), value).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<T>> {
        match self.store.find_by_id(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Igual que `find_by_id`, pero un documento ausente es un 404
    pub async fn get(&self, id: Uuid) -> AppResult<T> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error(T::RESOURCE, &id))
    }

    pub async fn find(&self, filter: &DocumentFilter) -> AppResult<Vec<T>> {
        let values = self.store.find(T::COLLECTION, filter).await?;
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }

    pub async fn update(&self, document: &T) -> AppResult<()> {
        let value = serde_json::to_value(document)?;
        if !self.store.replace(T::COLLECTION, document.id(), value).await? {
            return Err(not_found_error(T::RESOURCE, &document.id()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(T::COLLECTION, id).await? {
            return Err(not_found_error(T::RESOURCE, &id));
        }
        Ok(())
    }
}
