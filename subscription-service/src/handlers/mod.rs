pub mod auth;
pub mod health;
pub mod plans;
pub mod subscriptions;
pub mod users;

pub use health::{health_check, metrics, readiness_check};
