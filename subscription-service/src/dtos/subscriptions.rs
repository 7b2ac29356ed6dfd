use crate::dtos::{plans::PlanResponse, users::UserResponse};
use crate::models::{Subscription, SubscriptionStatus};
use crate::utils::{serialize_instant, validate_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user: String,
    #[validate(length(min = 1, message = "Plan ID is required"))]
    pub plan: String,
    pub status: Option<SubscriptionStatus>,
    /// Defaults to now.
    #[validate(custom(function = "validate_instant"))]
    pub start_date: Option<String>,
}

/// Partial update. `endDate` is derived and cannot be set directly.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user: Option<String>,
    #[validate(length(min = 1, message = "Plan ID is required"))]
    pub plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    #[validate(custom(function = "validate_instant"))]
    pub start_date: Option<String>,
}

/// A referenced record: the full document when it still exists, otherwise
/// just its id.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Populated(T),
    Id(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Reference<UserResponse>,
    pub plan: Reference<PlanResponse>,
    pub status: SubscriptionStatus,
    #[serde(serialize_with = "serialize_instant")]
    pub start_date: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub end_date: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionResponse {
    pub fn new(
        subscription: Subscription,
        user: Option<UserResponse>,
        plan: Option<PlanResponse>,
    ) -> Self {
        Self {
            id: subscription.id,
            user: user.map_or(Reference::Id(subscription.user), Reference::Populated),
            plan: plan.map_or(Reference::Id(subscription.plan), Reference::Populated),
            status: subscription.status,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            created_at: subscription.created_at,
            updated_at: subscription.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_date_must_parse() {
        let request: CreateSubscriptionRequest = serde_json::from_str(
            r#"{"user":"u1","plan":"p1","startDate":"31-01-2025"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);

        let request: CreateSubscriptionRequest =
            serde_json::from_str(r#"{"user":"u1","plan":"p1","startDate":"2025-01-31"}"#)
                .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_status_is_rejected_by_the_parser() {
        let parsed = serde_json::from_str::<UpdateSubscriptionRequest>(r#"{"status":"paused"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_references_fall_back_to_ids() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap();
        let subscription = Subscription::new(
            "u1".to_string(),
            "p1".to_string(),
            SubscriptionStatus::Active,
            start,
            end,
        );

        let json = serde_json::to_value(SubscriptionResponse::new(subscription, None, None)).unwrap();
        assert_eq!(json["user"], "u1");
        assert_eq!(json["plan"], "p1");
        assert_eq!(json["status"], "active");
        assert_eq!(json["startDate"], "2025-01-31T00:00:00.000Z");
        assert_eq!(json["endDate"], "2025-02-28T00:00:00.000Z");
    }
}
