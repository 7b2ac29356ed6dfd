use crate::dtos::plans::PlanResponse;
use crate::dtos::subscriptions::{
    CreateSubscriptionRequest, SubscriptionResponse, UpdateSubscriptionRequest,
};
use crate::dtos::users::UserResponse;
use crate::models::{Plan, Subscription, User};
use crate::services::error::ServiceError;
use crate::services::query::{Filter, ListQueryBuilder, ListResult, Projection, ID_FIELD, VERSION_FIELD};
use crate::services::store::{from_document, to_document, Collection, DocumentStore};
use crate::services::term::compute_end_date;
use crate::utils::parse_instant;
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn DocumentStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Lists subscriptions with `user` and `plan` populated. `search` matches
    /// the owning user's name or email rather than subscription fields.
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<ListResult, ServiceError> {
        let mut builder = ListQueryBuilder::new(&Subscription::SCHEMA, params);

        if let Some(term) = builder.search_term() {
            let user_ids = self.matching_user_ids(term).await?;
            builder = builder.restrict(Filter::In {
                field: "user".to_string(),
                values: user_ids,
            });
        }

        let query = builder
            .filter()?
            .sort()?
            .paginate()
            .limit_fields()?
            .build();

        let mut page = self.store.list(Collection::Subscriptions, &query).await?;
        self.populate_documents(&mut page.items).await?;
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<SubscriptionResponse, ServiceError> {
        let subscription = self.find_by_id(id).await?;
        self.populate(subscription).await
    }

    pub async fn create(
        &self,
        req: CreateSubscriptionRequest,
    ) -> Result<SubscriptionResponse, ServiceError> {
        let plan = self.plan(&req.plan).await?;
        let user = self.user(&req.user).await?;

        let start_date = match req.start_date.as_deref() {
            Some(raw) => parse_start_date(raw)?,
            None => Utc::now().trunc_subsecs(3),
        };
        let end_date = compute_end_date(start_date, plan.duration)?;

        let subscription = Subscription::new(
            req.user,
            req.plan,
            req.status.unwrap_or_default(),
            start_date,
            end_date,
        );
        self.store
            .insert(Collection::Subscriptions, to_document(&subscription)?)
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user,
            plan_id = %subscription.plan,
            "Subscription created"
        );

        Ok(SubscriptionResponse::new(
            subscription,
            Some(UserResponse::from(user)),
            Some(PlanResponse::from(plan)),
        ))
    }

    /// Applies a partial update. When `plan` or `startDate` changes, `endDate`
    /// is recomputed from the effective plan and start; otherwise it is left
    /// as stored.
    pub async fn update(
        &self,
        id: &str,
        req: UpdateSubscriptionRequest,
    ) -> Result<SubscriptionResponse, ServiceError> {
        let mut changes = doc! { "updatedAt": BsonDateTime::from_chrono(Utc::now()) };

        if let Some(user) = &req.user {
            self.user(user).await?;
            changes.insert("user", user.as_str());
        }
        if let Some(status) = req.status {
            changes.insert("status", status.as_str());
        }

        if req.plan.is_some() || req.start_date.is_some() {
            let current = self.find_by_id(id).await?;

            let plan_id = req.plan.as_deref().unwrap_or(&current.plan);
            let plan = self.plan(plan_id).await?;
            let start_date = match req.start_date.as_deref() {
                Some(raw) => parse_start_date(raw)?,
                None => current.start_date,
            };
            let end_date = compute_end_date(start_date, plan.duration)?;

            changes.insert("plan", plan.id.as_str());
            changes.insert("startDate", BsonDateTime::from_chrono(start_date));
            changes.insert("endDate", BsonDateTime::from_chrono(end_date));
        }

        let updated = self
            .store
            .update_by_id(Collection::Subscriptions, id, changes)
            .await?
            .ok_or(ServiceError::NotFound("Subscription not found"))?;

        tracing::info!(subscription_id = %id, "Subscription updated");
        self.populate(from_document(updated)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store
            .delete_by_id(Collection::Subscriptions, id)
            .await?
            .ok_or(ServiceError::NotFound("Subscription not found"))?;

        tracing::info!(subscription_id = %id, "Subscription deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Subscription, ServiceError> {
        let document = self
            .store
            .find_by_id(Collection::Subscriptions, id)
            .await?
            .ok_or(ServiceError::NotFound("Subscription not found"))?;
        from_document(document)
    }

    async fn plan(&self, id: &str) -> Result<Plan, ServiceError> {
        let document = self
            .store
            .find_by_id(Collection::Plans, id)
            .await?
            .ok_or(ServiceError::NotFound("Plan not found"))?;
        from_document(document)
    }

    async fn user(&self, id: &str) -> Result<User, ServiceError> {
        let document = self
            .store
            .find_by_id(Collection::Users, id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;
        from_document(document)
    }

    async fn matching_user_ids(&self, term: &str) -> Result<Vec<Bson>, ServiceError> {
        let predicate = Filter::Or(
            Subscription::USER_SEARCHABLE
                .iter()
                .map(|field| Filter::Contains {
                    field: field.to_string(),
                    term: term.to_string(),
                })
                .collect(),
        );
        let users = self
            .store
            .find_many(
                Collection::Users,
                &predicate,
                &Projection::Include(vec![ID_FIELD.to_string()]),
            )
            .await?;

        Ok(users
            .into_iter()
            .filter_map(|mut user| user.remove(ID_FIELD))
            .collect())
    }

    async fn populate(
        &self,
        subscription: Subscription,
    ) -> Result<SubscriptionResponse, ServiceError> {
        let (user, plan) = futures::try_join!(
            self.store.find_by_id(Collection::Users, &subscription.user),
            self.store.find_by_id(Collection::Plans, &subscription.plan)
        )?;

        let user = user.map(from_document::<User>).transpose()?.map(UserResponse::from);
        let plan = plan.map(from_document::<Plan>).transpose()?.map(PlanResponse::from);
        Ok(SubscriptionResponse::new(subscription, user, plan))
    }

    /// Replaces `user` / `plan` ids in projected list documents with the
    /// referenced records, when the field was selected and the record exists.
    async fn populate_documents(&self, documents: &mut [Document]) -> Result<(), ServiceError> {
        let users = self
            .referenced(
                documents,
                "user",
                Collection::Users,
                Projection::Exclude(
                    User::SCHEMA
                        .hidden
                        .iter()
                        .map(|f| f.to_string())
                        .chain([VERSION_FIELD.to_string()])
                        .collect(),
                ),
            )
            .await?;
        let plans = self
            .referenced(
                documents,
                "plan",
                Collection::Plans,
                Projection::Exclude(vec![VERSION_FIELD.to_string()]),
            )
            .await?;

        for document in documents.iter_mut() {
            for (field, records) in [("user", &users), ("plan", &plans)] {
                let Ok(id) = document.get_str(field) else {
                    continue;
                };
                if let Some(record) = records.get(id) {
                    document.insert(field, record.clone());
                }
            }
        }
        Ok(())
    }

    async fn referenced(
        &self,
        documents: &[Document],
        field: &str,
        collection: Collection,
        projection: Projection,
    ) -> Result<HashMap<String, Document>, ServiceError> {
        let mut ids: Vec<Bson> = Vec::new();
        for id in documents.iter().filter_map(|d| d.get_str(field).ok()) {
            let id = Bson::from(id);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = self
            .store
            .find_many(
                collection,
                &Filter::In {
                    field: ID_FIELD.to_string(),
                    values: ids,
                },
                &projection,
            )
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let id = record.get_str(ID_FIELD).ok()?.to_string();
                Some((id, record))
            })
            .collect())
    }
}

fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    parse_instant(raw)
        .map(|dt| dt.trunc_subsecs(3))
        .ok_or_else(|| ServiceError::invalid_field("startDate", "Invalid date"))
}
