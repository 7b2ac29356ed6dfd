use crate::utils::format_instant;
use mongodb::bson::{Bson, Document};
use serde::Serialize;
use serde_json::{Map, Value};

/// Success envelope: `{status: "success", token?, total?, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            token: None,
            total: None,
            data,
        }
    }

    pub fn list(data: T, total: u64) -> Self {
        Self {
            total: Some(total),
            ..Self::success(data)
        }
    }

    pub fn with_token(data: T, token: String) -> Self {
        Self {
            token: Some(token),
            ..Self::success(data)
        }
    }
}

/// Renders a stored document as API JSON. Dates use the same
/// millisecond RFC 3339 form as typed responses.
pub fn document_to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Document(document) => document_to_json(document),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::DateTime(dt) => Value::String(format_instant(&dt.to_chrono())),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(v) => Value::from(v),
        Bson::Int64(v) => Value::from(v),
        Bson::Double(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.into_relaxed_extjson(),
    }
}
