pub mod auth;
pub mod database;
pub mod error;
pub mod jwt;
pub mod memory;
pub mod plans;
pub mod query;
pub mod store;
pub mod subscriptions;
pub mod term;
pub mod users;

pub use auth::{AuthService, Session};
pub use database::MongoDb;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use memory::MemoryStore;
pub use plans::PlanService;
pub use store::{Collection, DocumentStore};
pub use subscriptions::SubscriptionService;
pub use users::UserService;
