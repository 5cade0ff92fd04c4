//! Firestore REST API types and JSON conversions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::Fields;

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Build a document body from JSON fields.
    pub fn from_json(fields: &Fields) -> Self {
        Self::new(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        )
    }

    /// Last segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    /// Document fields as a JSON object.
    pub fn to_json(&self) -> Fields {
        self.fields
            .as_ref()
            .map(|f| f.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
            .unwrap_or_default()
    }
}

/// List documents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub documents: Option<Vec<Document>>,
    pub next_page_token: Option<String>,
}

/// Convert a JSON value into a Firestore value.
///
/// Whole numbers become `integerValue`, everything else numeric becomes
/// `doubleValue`.
pub fn json_to_value(value: &serde_json::Value) -> Value {
    use serde_json::Value as Json;

    match value {
        Json::Null => Value::NullValue(()),
        Json::Bool(b) => Value::BooleanValue(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::IntegerValue(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Value::IntegerValue(u.to_string())
            } else {
                Value::DoubleValue(n.as_f64().unwrap_or_default())
            }
        }
        Json::String(s) => Value::StringValue(s.clone()),
        Json::Array(items) => Value::ArrayValue(ArrayValue {
            values: Some(items.iter().map(json_to_value).collect()),
        }),
        Json::Object(map) => Value::MapValue(MapValue {
            fields: Some(
                map.iter()
                    .map(|(k, v)| (k.clone(), json_to_value(v)))
                    .collect(),
            ),
        }),
    }
}

/// Convert a Firestore value into JSON. Timestamps become RFC 3339 strings.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::NullValue(()) => Json::Null,
        Value::BooleanValue(b) => Json::Bool(*b),
        Value::IntegerValue(s) => s
            .parse::<i64>()
            .map(Json::from)
            .or_else(|_| s.parse::<u64>().map(Json::from))
            .unwrap_or_else(|_| Json::String(s.clone())),
        Value::DoubleValue(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::TimestampValue(s) | Value::StringValue(s) => Json::String(s.clone()),
        Value::ArrayValue(arr) => Json::Array(
            arr.values
                .as_ref()
                .map(|v| v.iter().map(value_to_json).collect())
                .unwrap_or_default(),
        ),
        Value::MapValue(map) => Json::Object(
            map.fields
                .as_ref()
                .map(|f| f.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
                .unwrap_or_default(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_wire_format() {
        let value = json_to_value(&json!(42));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "integerValue": "42" }));
    }

    #[test]
    fn test_null_wire_format() {
        let value = json_to_value(&json!(null));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "nullValue": null }));
    }

    #[test]
    fn test_nested_document_conversion() {
        let fields = json!({
            "uid": "abc",
            "currentStep": 3,
            "completed": false,
            "score": 0.5,
            "profile": { "firstName": "Ada", "tags": ["a", "b"] },
            "session": null
        });
        let doc = Document::from_json(fields.as_object().unwrap());
        let back = serde_json::Value::Object(doc.to_json());
        assert_eq!(back, fields);
    }

    #[test]
    fn test_timestamp_reads_as_string() {
        let value = Value::TimestampValue("2024-01-01T00:00:00Z".to_string());
        assert_eq!(value_to_json(&value), json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_document_id_from_name() {
        let doc = Document {
            name: Some("projects/p/databases/(default)/documents/mail/xyz".to_string()),
            fields: None,
            create_time: None,
            update_time: None,
        };
        assert_eq!(doc.id(), Some("xyz"));
        assert!(doc.to_json().is_empty());
    }

    #[test]
    fn test_parse_rest_document() {
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/registrationProgress/u1",
            "fields": {
                "currentStep": { "integerValue": "2" },
                "completed": { "booleanValue": true }
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        });
        let doc: Document = serde_json::from_value(raw).unwrap();
        let fields = doc.to_json();
        assert_eq!(fields["currentStep"], json!(2));
        assert_eq!(fields["completed"], json!(true));
    }
}
