//! The document store seam.
//!
//! Services talk to [`DocumentStore`] only; `main` decides whether that is
//! MongoDB or the in-process [`MemoryStore`](super::MemoryStore).

use crate::services::error::ServiceError;
use crate::services::query::{Filter, ListQuery, ListResult, Projection};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Plans,
    Subscriptions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Users,
        Collection::Plans,
        Collection::Subscriptions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Plans => "plans",
            Collection::Subscriptions => "subscriptions",
        }
    }

    /// Fields backed by a unique index.
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["email"],
            Collection::Plans | Collection::Subscriptions => &[],
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fails with [`ServiceError::DuplicateKey`] on a unique field clash.
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), ServiceError>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, ServiceError>;

    /// One sorted, projected page.
    async fn find(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Document>, ServiceError>;

    /// Every match, unsorted and unpaged.
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>, ServiceError>;

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, ServiceError>;

    /// Sets `changes`, bumps `__v` and returns the updated document.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, ServiceError>;

    /// Returns the removed document.
    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;

    async fn close(&self);

    /// A page plus the total for the same predicate, fetched concurrently.
    async fn list(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<ListResult, ServiceError> {
        let (items, total) = futures::try_join!(
            self.find(collection, query),
            self.count(collection, &query.filter)
        )?;
        Ok(ListResult { items, total })
    }
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, ServiceError> {
    Ok(mongodb::bson::to_document(value)?)
}

pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, ServiceError> {
    Ok(mongodb::bson::from_document(document)?)
}
