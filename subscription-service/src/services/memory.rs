use crate::services::error::ServiceError;
use crate::services::query::{compare_documents, Filter, ListQuery, Projection, ID_FIELD, VERSION_FIELD};
use crate::services::store::{Collection, DocumentStore};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process document store with the same observable behaviour as
/// [`MongoDb`](super::MongoDb): unique fields, sorting, paging, projection and
/// version bumps. Used for local runs without a database and by the test
/// suite.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_of(document: &Document) -> Option<&str> {
    document.get_str(ID_FIELD).ok()
}

/// Fails when `candidate` shares a unique field value with any other record.
fn check_unique(
    collection: Collection,
    documents: &[Document],
    candidate: &Document,
) -> Result<(), ServiceError> {
    let candidate_id = id_of(candidate);
    for field in collection.unique_fields() {
        let Some(value) = candidate.get(*field) else {
            continue;
        };
        let clash = documents
            .iter()
            .filter(|existing| id_of(existing) != candidate_id)
            .any(|existing| existing.get(*field) == Some(value));
        if clash {
            return Err(ServiceError::DuplicateKey);
        }
    }
    Ok(())
}

fn bump_version(document: &mut Document) {
    let next = match document.get(VERSION_FIELD) {
        Some(Bson::Int32(v)) => Bson::Int32(v + 1),
        Some(Bson::Int64(v)) => Bson::Int64(v + 1),
        _ => Bson::Int32(1),
    };
    document.insert(VERSION_FIELD, next);
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), ServiceError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        if let Some(id) = id_of(&document) {
            if documents.iter().any(|existing| id_of(existing) == Some(id)) {
                return Err(ServiceError::DuplicateKey);
            }
        }
        check_unique(collection, documents, &document)?;

        documents.push(document);
        Ok(())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|d| id_of(d) == Some(id)))
            .cloned())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, ServiceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Document>, ServiceError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<&Document> = documents
            .iter()
            .filter(|d| query.filter.matches(d))
            .collect();
        matches.sort_by(|a, b| compare_documents(a, b, &query.sort));

        let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matches
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| query.projection.apply(d.clone()))
            .collect())
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>, ServiceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| filter.matches(d))
                    .map(|d| projection.apply(d.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, ServiceError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(&collection)
            .map(|documents| documents.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, ServiceError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        let Some(position) = documents.iter().position(|d| id_of(d) == Some(id)) else {
            return Ok(None);
        };

        let mut updated = documents[position].clone();
        for (key, value) in changes {
            updated.insert(key, value);
        }
        bump_version(&mut updated);
        check_unique(collection, documents, &updated)?;

        documents[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        Ok(documents
            .iter()
            .position(|d| id_of(d) == Some(id))
            .map(|position| documents.remove(position)))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn close(&self) {
        tracing::debug!("Memory store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::query::{SortDirection, SortKey};
    use mongodb::bson::doc;

    fn user(id: &str, email: &str) -> Document {
        doc! { "_id": id, "name": id, "email": email, "__v": 0_i32 }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_unique_fields() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, user("u1", "a@example.com"))
            .await
            .unwrap();

        let err = store
            .insert(Collection::Users, user("u2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey));

        // plans have no unique fields
        store
            .insert(Collection::Plans, doc! { "_id": "p1", "name": "Alfa" })
            .await
            .unwrap();
        store
            .insert(Collection::Plans, doc! { "_id": "p2", "name": "Alfa" })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_bumps_version_and_returns_new_state() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, user("u1", "a@example.com"))
            .await
            .unwrap();

        let updated = store
            .update_by_id(Collection::Users, "u1", doc! { "name": "Ada" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_str("name").unwrap(), "Ada");
        assert_eq!(updated.get_i32("__v").unwrap(), 1);

        let missing = store
            .update_by_id(Collection::Users, "nope", doc! { "name": "x" })
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_cannot_steal_a_unique_value() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, user("u1", "a@example.com"))
            .await
            .unwrap();
        store
            .insert(Collection::Users, user("u2", "b@example.com"))
            .await
            .unwrap();

        let err = store
            .update_by_id(Collection::Users, "u2", doc! { "email": "a@example.com" })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey));

        // keeping your own value is fine
        store
            .update_by_id(Collection::Users, "u1", doc! { "email": "a@example.com" })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn find_sorts_pages_and_projects() {
        let store = MemoryStore::new();
        for (id, price) in [("a", 30.0), ("b", 10.0), ("c", 20.0)] {
            store
                .insert(Collection::Plans, doc! { "_id": id, "price": price, "__v": 0_i32 })
                .await
                .unwrap();
        }

        let query = ListQuery {
            filter: Filter::all(),
            sort: vec![SortKey {
                field: "price".to_string(),
                direction: SortDirection::Ascending,
            }],
            projection: Projection::Exclude(vec!["__v".to_string()]),
            page: 2,
            limit: 2,
        };
        let page = store.find(Collection::Plans, &query).await.unwrap();

        assert_eq!(page, vec![doc! { "_id": "a", "price": 30.0 }]);
        assert_eq!(store.count(Collection::Plans, &Filter::all()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn delete_returns_the_removed_record() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, user("u1", "a@example.com"))
            .await
            .unwrap();

        let removed = store.delete_by_id(Collection::Users, "u1").await.unwrap();
        assert_eq!(removed.unwrap().get_str("_id").unwrap(), "u1");
        assert!(store
            .delete_by_id(Collection::Users, "u1")
            .await
            .unwrap()
            .is_none());
    }
}
