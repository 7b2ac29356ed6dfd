pub mod auth;
pub mod plans;
pub mod response;
pub mod subscriptions;
pub mod users;

pub use response::{document_to_json, ApiResponse};
