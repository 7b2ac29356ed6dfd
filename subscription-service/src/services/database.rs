use crate::services::error::ServiceError;
use crate::services::query::{sort_document, Filter, ListQuery, Projection, ID_FIELD, VERSION_FIELD};
use crate::services::store::{Collection, DocumentStore};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Database, IndexModel,
};
use service_core::error::AppError;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for subscription-service");

        for collection in Collection::ALL {
            for &field in collection.unique_fields() {
                let index = IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(
                        IndexOptions::builder()
                            .name(format!("{}_unique", field))
                            .unique(true)
                            .build(),
                    )
                    .build();

                self.collection(collection)
                    .create_index(index, None)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to create unique index on {}.{}: {}",
                            collection.name(),
                            field,
                            e
                        );
                        AppError::from(e)
                    })?;
                tracing::info!("Created unique index on {}.{}", collection.name(), field);
            }
        }

        // Reference lookups: subscriptions by owner and by plan
        for field in ["user", "plan"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .name(format!("{}_lookup", field))
                        .build(),
                )
                .build();

            self.collection(Collection::Subscriptions)
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create index on subscriptions.{}: {}", field, e);
                    AppError::from(e)
                })?;
            tracing::info!("Created index on subscriptions.{}", field);
        }

        Ok(())
    }

    pub fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }

}

/// The driver sends `skip` as a signed 64-bit integer; pages past that bound
/// are empty anyway.
fn mongo_skip(query: &ListQuery) -> u64 {
    query.skip().min(i64::MAX as u64)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn write_error(err: mongodb::error::Error) -> ServiceError {
    if is_duplicate_key(&err) {
        ServiceError::DuplicateKey
    } else {
        ServiceError::Database(err)
    }
}

#[async_trait]
impl DocumentStore for MongoDb {
    async fn insert(&self, collection: Collection, document: Document) -> Result<(), ServiceError> {
        self.collection(collection)
            .insert_one(document, None)
            .await
            .map_err(write_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError> {
        Ok(self
            .collection(collection)
            .find_one(doc! { ID_FIELD: id }, None)
            .await?)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, ServiceError> {
        Ok(self
            .collection(collection)
            .find_one(filter.to_document(), None)
            .await?)
    }

    async fn find(
        &self,
        collection: Collection,
        query: &ListQuery,
    ) -> Result<Vec<Document>, ServiceError> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let options = FindOptions::builder()
            .sort(sort_document(&query.sort))
            .skip(mongo_skip(query))
            .limit(limit)
            .projection(query.projection.to_document())
            .build();

        let cursor = self
            .collection(collection)
            .find(query.filter.to_document(), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>, ServiceError> {
        let options = FindOptions::builder()
            .projection(projection.to_document())
            .build();

        let cursor = self
            .collection(collection)
            .find(filter.to_document(), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, ServiceError> {
        Ok(self
            .collection(collection)
            .count_documents(filter.to_document(), None)
            .await?)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, ServiceError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection(collection)
            .find_one_and_update(
                doc! { ID_FIELD: id },
                doc! { "$set": changes, "$inc": { VERSION_FIELD: 1 } },
                options,
            )
            .await
            .map_err(write_error)
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, ServiceError> {
        Ok(self
            .collection(collection)
            .find_one_and_delete(doc! { ID_FIELD: id }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, limit: u64) -> ListQuery {
        ListQuery {
            filter: Filter::all(),
            sort: Vec::new(),
            projection: Projection::Exclude(Vec::new()),
            page,
            limit,
        }
    }

    #[test]
    fn skip_is_clamped_to_the_driver_range() {
        assert_eq!(mongo_skip(&page(3, 10)), 20);
        assert_eq!(mongo_skip(&page(1_000_000_000_000_000_000, 10)), i64::MAX as u64);
        assert_eq!(mongo_skip(&page(u64::MAX, u64::MAX)), i64::MAX as u64);
    }
}
