use crate::dtos::plans::{CreatePlanRequest, UpdatePlanRequest};
use crate::models::Plan;
use crate::services::error::ServiceError;
use crate::services::query::{ListQueryBuilder, ListResult};
use crate::services::store::{from_document, to_document, Collection, DocumentStore};
use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct PlanService {
    store: Arc<dyn DocumentStore>,
}

impl PlanService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, params: &HashMap<String, String>) -> Result<ListResult, ServiceError> {
        let query = ListQueryBuilder::new(&Plan::SCHEMA, params)
            .search(Plan::SEARCHABLE)
            .filter()?
            .sort()?
            .paginate()
            .limit_fields()?
            .build();

        self.store.list(Collection::Plans, &query).await
    }

    pub async fn get(&self, id: &str) -> Result<Plan, ServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Plan not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Plan>, ServiceError> {
        self.store
            .find_by_id(Collection::Plans, id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn create(&self, req: CreatePlanRequest) -> Result<Plan, ServiceError> {
        let plan = Plan::new(req.name, req.price, req.duration);
        self.store
            .insert(Collection::Plans, to_document(&plan)?)
            .await?;

        tracing::info!(plan_id = %plan.id, name = %plan.name, "Plan created");
        Ok(plan)
    }

    pub async fn update(&self, id: &str, req: UpdatePlanRequest) -> Result<Plan, ServiceError> {
        let mut changes = doc! { "updatedAt": BsonDateTime::from_chrono(Utc::now()) };
        if let Some(name) = req.name {
            changes.insert("name", name);
        }
        if let Some(price) = req.price {
            changes.insert("price", price);
        }
        if let Some(duration) = req.duration {
            changes.insert("duration", duration);
        }

        let updated = self
            .store
            .update_by_id(Collection::Plans, id, changes)
            .await?
            .ok_or(ServiceError::NotFound("Plan not found"))?;

        tracing::info!(plan_id = %id, "Plan updated");
        from_document(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store
            .delete_by_id(Collection::Plans, id)
            .await?
            .ok_or(ServiceError::NotFound("Plan not found"))?;

        tracing::info!(plan_id = %id, "Plan deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;

    fn request(name: &str, price: f64, duration: i32) -> CreatePlanRequest {
        CreatePlanRequest {
            name: name.to_string(),
            price,
            duration,
        }
    }

    #[tokio::test]
    async fn price_range_filters_are_numeric() {
        let plans = PlanService::new(Arc::new(MemoryStore::new()));
        for (name, price) in [("Alfa 4G", 15.0), ("touch 10GB Monthly", 19.0), ("Gold", 120.0)] {
            plans.create(request(name, price, 1)).await.unwrap();
        }

        let params = HashMap::from([
            ("price.gte".to_string(), "15".to_string()),
            ("price.lt".to_string(), "100".to_string()),
            ("sort".to_string(), "price".to_string()),
        ]);
        let page = plans.list(&params).await.unwrap();

        assert_eq!(page.total, 2);
        let names: Vec<&str> = page
            .items
            .iter()
            .map(|d| d.get_str("name").unwrap())
            .collect();
        assert_eq!(names, vec!["Alfa 4G", "touch 10GB Monthly"]);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let plans = PlanService::new(Arc::new(MemoryStore::new()));
        let plan = plans.create(request("Alfa", 10.0, 3)).await.unwrap();

        let updated = plans
            .update(
                &plan.id,
                UpdatePlanRequest {
                    price: Some(12.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Alfa");
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.duration, 3);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.created_at, plan.created_at);
    }
}
