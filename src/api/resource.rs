//! Generic CRUD service over a backend collection.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use validator::Validate;

use crate::api::ApiClient;
use crate::domain::{EntityId, PageRequest};
use crate::{Page, Result};

/// A backend-owned record reachable under `/{PATH}`.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + Validate + Default + Send + Sync + 'static {
    /// Collection path, also the plural used in messages.
    const PATH: &'static str;
    /// Singular display name.
    const LABEL: &'static str;

    fn id(&self) -> EntityId;
}

/// CRUD over one resource collection.
pub struct ResourceService<T> {
    client: ApiClient,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self { Self { client: self.client.clone(), _marker: PhantomData } }
}

impl<T: Resource> ResourceService<T> {
    pub fn new(client: ApiClient) -> Self {
        Self { client, _marker: PhantomData }
    }

    pub fn client(&self) -> &ApiClient { &self.client }

    pub fn item_path(id: EntityId) -> String { format!("{}/{}", T::PATH, id) }

    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn list_page(&self, page: PageRequest) -> Result<Page<T>> {
        debug!("Sending request");
        let query = [
            ("pageNumber", page.page_number().to_string()),
            ("pageSize", page.page_size.to_string()),
        ];
        self.client.get(T::PATH, &query).await
    }

    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn get(&self, id: EntityId) -> Result<T> {
        debug!("Sending request");
        self.client.get(&Self::item_path(id), &[]).await
    }

    /// Creates the record; the backend echoes it back with its new id.
    #[instrument(skip(self, entity), fields(resource = T::PATH))]
    pub async fn create(&self, entity: &T) -> Result<T> {
        debug!("Sending request");
        let created: Option<T> = self.client.post(T::PATH, entity).await?;
        Ok(created.unwrap_or_else(|| entity.clone()))
    }

    #[instrument(skip(self, entity), fields(resource = T::PATH, id = %entity.id()))]
    pub async fn update(&self, entity: &T) -> Result<T> {
        debug!("Sending request");
        let updated: Option<T> = self.client.put(&Self::item_path(entity.id()), entity).await?;
        Ok(updated.unwrap_or_else(|| entity.clone()))
    }

    /// Create when the id is still `0`, update otherwise.
    pub async fn save(&self, entity: &T) -> Result<T> {
        if entity.id().is_new() { self.create(entity).await } else { self.update(entity).await }
    }

    #[instrument(skip(self), fields(resource = T::PATH))]
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        debug!("Sending request");
        self.client.delete(&Self::item_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, Product};

    #[test]
    fn test_item_paths() {
        assert_eq!(ResourceService::<Product>::item_path(EntityId::new(42)), "products/42");
        assert_eq!(ResourceService::<Category>::item_path(EntityId::new(7)), "categories/7");
    }
}
