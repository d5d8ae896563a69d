//! Schema-data: the declarative, serializable description of a modifier.
//!
//! ```json
//! { "name": "length", "priority": 5, "data": { "min": 1, "max": 20 } }
//! ```
//!
//! `priority` is the per-instance offset and is omitted when the modifier
//! uses its prototype's offset. `data` is whatever the prototype exports,
//! by default its configured options; it may nest further schema-data maps.

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default)]
    pub data: Value,
}

impl SchemaData {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            priority: None,
            data,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Configuration entries carried in `data`. Non-map data yields nothing.
    pub fn options(&self) -> Vec<(String, Value)> {
        match &self.data {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("name".to_string(), serde_json::Value::from(self.name.clone()));
        if let Some(priority) = self.priority {
            object.insert("priority".to_string(), serde_json::Value::from(priority));
        }
        object.insert("data".to_string(), self.data.to_json());
        serde_json::Value::Object(object)
    }
}
