use crate::services::query::{FieldKind, ResourceSchema};
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Whole months.
    pub duration: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i32,
}

impl Plan {
    pub const SCHEMA: ResourceSchema = ResourceSchema {
        fields: &[
            ("name", FieldKind::Text),
            ("price", FieldKind::Number),
            ("duration", FieldKind::Integer),
            ("createdAt", FieldKind::Date),
            ("updatedAt", FieldKind::Date),
        ],
        hidden: &[],
    };

    pub const SEARCHABLE: &'static [&'static str] = &["name"];

    pub fn new(name: String, price: f64, duration: i32) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            price,
            duration,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}
