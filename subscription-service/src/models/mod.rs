pub mod plan;
pub mod subscription;
pub mod user;

pub use plan::Plan;
pub use subscription::{Subscription, SubscriptionStatus};
pub use user::{Role, User};
