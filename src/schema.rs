//! Entity types and records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System-assigned entity identifier
pub type EntityId = i64;

/// Free-form entity payload. Values are strings, as submitted by forms.
pub type EntityData = BTreeMap<String, String>;

/// A named, user-defined record schema.
///
/// The attribute list is advisory: entity payloads are never checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Unique name of the type (e.g., "Contact")
    pub name: String,
    /// Attribute names, in declaration order
    pub attributes: Vec<String>,
}

impl EntityType {
    /// Create a new entity type
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the type declares the given attribute
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// One stored record, tagged with the name of its entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub data: EntityData,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Look up a payload value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Payload keys that the entity's type does not declare
    pub fn undeclared_keys<'a>(&'a self, entity_type: &EntityType) -> Vec<&'a str> {
        self.data
            .keys()
            .filter(|k| !entity_type.has_attribute(k))
            .map(String::as_str)
            .collect()
    }
}

/// Build an [`EntityData`] map from `(key, value)` pairs
pub fn entity_data<I, K, V>(pairs: I) -> EntityData
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_type_field() {
        let entity = Entity {
            id: 1,
            type_name: "Contact".to_string(),
            data: entity_data([("name", "Ada")]),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Contact");
        assert_eq!(json["data"]["name"], "Ada");
    }

    #[test]
    fn test_undeclared_keys() {
        let contact = EntityType::new("Contact", ["name", "email"]);
        let entity = Entity {
            id: 1,
            type_name: "Contact".to_string(),
            data: entity_data([("name", "Ada"), ("phone", "555")]),
            created_at: Utc::now(),
        };
        assert_eq!(entity.undeclared_keys(&contact), vec!["phone"]);
        assert_eq!(entity.get("name"), Some("Ada"));
    }
}
