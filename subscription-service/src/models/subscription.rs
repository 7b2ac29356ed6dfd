use crate::services::query::{FieldKind, ResourceSchema};
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status. Never changes on its own; `expired` is set explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: &'static [&'static str] = &["active", "cancelled", "expired"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user's id.
    pub user: String,
    /// Plan id.
    pub plan: String,
    #[serde(default)]
    pub status: SubscriptionStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i32,
}

impl Subscription {
    pub const SCHEMA: ResourceSchema = ResourceSchema {
        fields: &[
            ("user", FieldKind::Reference),
            ("plan", FieldKind::Reference),
            ("status", FieldKind::Choice(SubscriptionStatus::ALL)),
            ("startDate", FieldKind::Date),
            ("endDate", FieldKind::Date),
            ("createdAt", FieldKind::Date),
            ("updatedAt", FieldKind::Date),
        ],
        hidden: &[],
    };

    /// Fields of the owning user matched by `search`.
    pub const USER_SEARCHABLE: &'static [&'static str] = &["name", "email"];

    pub fn new(
        user: String,
        plan: String,
        status: SubscriptionStatus,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id: Uuid::new_v4().to_string(),
            user,
            plan,
            status,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}
