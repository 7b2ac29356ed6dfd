use crate::dtos::users::{CreateUserRequest, UpdateUserRequest};
use crate::models::{user::normalize_email, Role, User};
use crate::services::error::ServiceError;
use crate::services::query::{Filter, ListQueryBuilder, ListResult};
use crate::services::store::{from_document, to_document, Collection, DocumentStore};
use crate::utils::{hash_password, Password};
use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, params: &HashMap<String, String>) -> Result<ListResult, ServiceError> {
        let query = ListQueryBuilder::new(&User::SCHEMA, params)
            .search(User::SEARCHABLE)
            .filter()?
            .sort()?
            .paginate()
            .limit_fields()?
            .build();

        self.store.list(Collection::Users, &query).await
    }

    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        self.find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.store
            .find_by_id(Collection::Users, id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        self.store
            .find_one(Collection::Users, &Filter::eq("email", normalize_email(email)))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Hashes the password and stores a new user. A taken email surfaces as
    /// [`ServiceError::DuplicateKey`].
    pub async fn create(
        &self,
        name: String,
        email: String,
        password: Password,
        role: Role,
    ) -> Result<User, ServiceError> {
        let password_hash = hash_password(&password).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
        })?;

        let user = User::new(name, email, password_hash.into_string(), role);
        self.store
            .insert(Collection::Users, to_document(&user)?)
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    pub async fn create_from(&self, req: CreateUserRequest) -> Result<User, ServiceError> {
        self.create(
            req.name,
            req.email,
            Password::new(req.password),
            req.role.unwrap_or_default(),
        )
        .await
    }

    pub async fn update(&self, id: &str, req: UpdateUserRequest) -> Result<User, ServiceError> {
        let mut changes = doc! { "updatedAt": BsonDateTime::from_chrono(Utc::now()) };
        if let Some(name) = req.name {
            changes.insert("name", name);
        }
        if let Some(email) = req.email {
            changes.insert("email", normalize_email(&email));
        }
        if let Some(role) = req.role {
            changes.insert("role", role.as_str());
        }
        if let Some(password) = req.password {
            let hash = hash_password(&Password::new(password)).map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e))
            })?;
            changes.insert("password", hash.into_string());
        }

        let updated = self
            .store
            .update_by_id(Collection::Users, id, changes)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;

        tracing::info!(user_id = %id, "User updated");
        from_document(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store
            .delete_by_id(Collection::Users, id)
            .await?
            .ok_or(ServiceError::NotFound("User not found"))?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
