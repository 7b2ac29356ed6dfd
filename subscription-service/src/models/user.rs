use crate::services::query::{FieldKind, ResourceSchema};
use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub const ALL: &'static [&'static str] = &["admin", "user"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v", default)]
    pub version: i32,
}

impl User {
    pub const SCHEMA: ResourceSchema = ResourceSchema {
        fields: &[
            ("name", FieldKind::Text),
            ("email", FieldKind::Text),
            ("role", FieldKind::Choice(Role::ALL)),
            ("createdAt", FieldKind::Date),
            ("updatedAt", FieldKind::Date),
        ],
        hidden: &["password"],
    };

    pub const SEARCHABLE: &'static [&'static str] = &["name", "email"];

    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        // BSON dates hold milliseconds
        let now = Utc::now().trunc_subsecs(3);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email: normalize_email(&email),
            password: password_hash,
            role,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Emails are stored trimmed and lower-cased so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
