use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

/// Reasons the raw mapping artifact could not be turned into lookup tables
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("mapping is not a tuple; found type: {found}")]
    NotAPair { found: &'static str },

    #[error("mapping tuple does not contain enough elements (found {len})")]
    TooFewElements { len: usize },

    #[error("mapping element {position} is not a dictionary")]
    NotADictionary { position: usize },

    #[error("mapping element {position} has a key that is neither a string nor a number")]
    InvalidKey { position: usize },

    #[error("mapping element {position} maps {key:?} to something other than a non-negative index")]
    InvalidIndex { position: usize, key: String },
}

/// External identifier -> internal index table with normalized string keys.
///
/// Keeps the order entries appeared in the artifact so callers can show a
/// stable sample of identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdMapping {
    index: HashMap<String, usize>,
    order: Vec<String>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry; a repeated key keeps its first position but takes the new index
    pub fn insert(&mut self, external_id: String, internal: usize) {
        if self.index.insert(external_id.clone(), internal).is_none() {
            self.order.push(external_id);
        }
    }

    pub fn get(&self, external_id: &str) -> Option<usize> {
        self.index.get(external_id).copied()
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.index.contains_key(external_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in artifact order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(move |key| (key.as_str(), self.index[key]))
    }

    /// External identifiers in artifact order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }
}

pub type UserMapping = IdMapping;
pub type ItemMapping = IdMapping;

/// Internal item index -> external item identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseItemMapping(HashMap<usize, String>);

impl ReverseItemMapping {
    /// Inverts an item mapping. Duplicate indices resolve to the later entry.
    pub fn from_items(items: &ItemMapping) -> Self {
        Self(
            items
                .iter()
                .map(|(external, internal)| (internal, external.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, internal: usize) -> Option<&str> {
        self.0.get(&internal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized user and item tables plus the derived reverse item table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMappings {
    pub users: UserMapping,
    pub items: ItemMapping,
    pub reverse_items: ReverseItemMapping,
    /// Set when the raw artifact was unusable and empty tables were substituted
    pub warning: Option<MappingError>,
}

impl NormalizedMappings {
    /// Builds lookup tables from the raw mapping artifact.
    ///
    /// A malformed artifact never fails the caller: both tables come back
    /// empty and the problem is kept in `warning` for display.
    pub fn from_raw(raw: &Value) -> Self {
        match parse_pair(raw) {
            Ok((users, items)) => {
                let reverse_items = ReverseItemMapping::from_items(&items);
                Self {
                    users,
                    items,
                    reverse_items,
                    warning: None,
                }
            }
            Err(err) => Self {
                warning: Some(err),
                ..Self::default()
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.warning.is_some()
    }
}

/// Validates the `[user_map, item_map, ...]` shape. Trailing elements are ignored.
pub fn parse_pair(raw: &Value) -> Result<(UserMapping, ItemMapping), MappingError> {
    let elements = match raw {
        Value::Array(elements) => elements,
        other => {
            return Err(MappingError::NotAPair {
                found: json_type_name(other),
            })
        }
    };

    if elements.len() < 2 {
        return Err(MappingError::TooFewElements {
            len: elements.len(),
        });
    }

    let users = parse_table(&elements[0], 0)?;
    let items = parse_table(&elements[1], 1)?;
    Ok((users, items))
}

/// A table is either a JSON object or a list of `[key, index]` pairs.
/// The pair form lets numeric keys survive serialization.
fn parse_table(value: &Value, position: usize) -> Result<IdMapping, MappingError> {
    let mut mapping = IdMapping::new();

    match value {
        Value::Object(entries) => {
            for (key, index) in entries {
                let internal = parse_index(index, position, key)?;
                mapping.insert(key.clone(), internal);
            }
        }
        Value::Array(pairs) => {
            for pair in pairs {
                let (key, index) = match pair.as_array().map(Vec::as_slice) {
                    Some([key, index]) => (key, index),
                    _ => return Err(MappingError::NotADictionary { position }),
                };
                let key = normalize_key(key).ok_or(MappingError::InvalidKey { position })?;
                let internal = parse_index(index, position, &key)?;
                mapping.insert(key, internal);
            }
        }
        _ => return Err(MappingError::NotADictionary { position }),
    }

    Ok(mapping)
}

/// Canonical string form of an identifier key
pub fn normalize_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_index(value: &Value, position: usize, key: &str) -> Result<usize, MappingError> {
    value
        .as_u64()
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| MappingError::InvalidIndex {
            position,
            key: key.to_string(),
        })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_tables_are_normalized() {
        let raw = json!([{"1": 0, "2": 1}, {"A": 0, "B": 1, "C": 2}]);
        let mappings = NormalizedMappings::from_raw(&raw);

        assert!(!mappings.is_malformed());
        assert_eq!(mappings.users.get("1"), Some(0));
        assert_eq!(mappings.users.get("2"), Some(1));
        assert_eq!(mappings.items.len(), 3);
        assert_eq!(mappings.reverse_items.get(2), Some("C"));
    }

    #[test]
    fn test_integer_keys_become_strings() {
        let raw = json!([[[42, 0], [5506791954036110u64, 1]], [["A", 0]]]);
        let mappings = NormalizedMappings::from_raw(&raw);

        assert_eq!(mappings.users.get("42"), Some(0));
        assert_eq!(mappings.users.get("5506791954036110"), Some(1));
        assert!(mappings.users.get("42.0").is_none());
    }

    #[test]
    fn test_trailing_elements_are_ignored() {
        let raw = json!([{"1": 0}, {"A": 0}, {"unused": true}, 7]);
        let mappings = NormalizedMappings::from_raw(&raw);

        assert!(mappings.warning.is_none());
        assert_eq!(mappings.users.len(), 1);
        assert_eq!(mappings.items.len(), 1);
    }

    #[test]
    fn test_not_a_pair_yields_empty_tables() {
        let raw = json!({"1": 0});
        let mappings = NormalizedMappings::from_raw(&raw);

        assert_eq!(
            mappings.warning,
            Some(MappingError::NotAPair { found: "object" })
        );
        assert!(mappings.users.is_empty());
        assert!(mappings.items.is_empty());
        assert!(mappings.reverse_items.is_empty());
    }

    #[test]
    fn test_single_element_is_too_few() {
        let raw = json!([{"1": 0}]);
        let mappings = NormalizedMappings::from_raw(&raw);

        assert_eq!(
            mappings.warning,
            Some(MappingError::TooFewElements { len: 1 })
        );
        assert!(mappings.users.is_empty());
    }

    #[test]
    fn test_negative_index_is_malformed() {
        let raw = json!([{"1": -3}, {"A": 0}]);
        let err = parse_pair(&raw).unwrap_err();
        assert_eq!(
            err,
            MappingError::InvalidIndex {
                position: 0,
                key: "1".to_string()
            }
        );
    }

    #[test]
    fn test_non_table_element_is_malformed() {
        let raw = json!([{"1": 0}, "items"]);
        assert_eq!(
            parse_pair(&raw).unwrap_err(),
            MappingError::NotADictionary { position: 1 }
        );
    }

    #[test]
    fn test_reverse_mapping_later_entry_wins() {
        let raw = json!([{}, [["A", 0], ["B", 0]]]);
        let mappings = NormalizedMappings::from_raw(&raw);
        assert_eq!(mappings.reverse_items.get(0), Some("B"));
    }

    #[test]
    fn test_reverse_mapping_inverts_every_entry() {
        let raw = json!([{}, {"x": 3, "y": 1, "z": 0}]);
        let mappings = NormalizedMappings::from_raw(&raw);
        for (external, internal) in mappings.items.iter() {
            assert_eq!(mappings.reverse_items.get(internal), Some(external));
        }
    }

    #[test]
    fn test_keys_keep_artifact_order() {
        let raw = json!([{"9": 0, "3": 1, "7": 2}, {}]);
        let mappings = NormalizedMappings::from_raw(&raw);
        let keys: Vec<&str> = mappings.users.keys().collect();
        assert_eq!(keys, vec!["9", "3", "7"]);
    }
}
