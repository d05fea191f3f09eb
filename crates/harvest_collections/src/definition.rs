//! Definition file schema
//!
//! A file holds one collection group:
//!
//! ```json
//! {
//!   "groupPolicy": { "action": "take", "notify": true, "repeat": false },
//!   "useMCM": true,
//!   "collections": [
//!     { "name": "Ancient Coins", "description": "...",
//!       "rootFilter": { "operator": "OR", "condition": { "signature": ["MISC"] } } }
//!   ]
//! }
//! ```
//!
//! [`validate_group`] checks the whole document before anything is built.
//! Any violation rejects the file.

use harvest_conditions::condition::SIGNATURES;
use harvest_conditions::tree::MAX_DEPTH;
use harvest_conditions::{MatchIf, Operator, Scope};
use harvest_core::{FormId, ObjectType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CollectionError, CollectionResult};
use crate::policy::CollectionPolicy;

/// One collection as written in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Overrides the group policy when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CollectionPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
}

/// A definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupDefinition {
    #[serde(default)]
    pub group_policy: CollectionPolicy,
    /// Group is editable from the in-game settings menu
    #[serde(rename = "useMCM", default)]
    pub use_mcm: bool,
    pub collections: Vec<CollectionDefinition>,
}

/// Validate a definition document and decode it
pub fn validate_group(document: &Value, path: &str) -> CollectionResult<GroupDefinition> {
    let group = GroupDefinition::deserialize(document)
        .map_err(|e| CollectionError::schema(path, e.to_string()))?;

    for (index, collection) in group.collections.iter().enumerate() {
        let at = format!("{}/collections/{}", path, index);
        if collection.name.trim().is_empty() {
            return Err(CollectionError::schema(at, "name must not be empty"));
        }
        if collection.root_filter.is_some() && collection.category.is_some() {
            return Err(CollectionError::schema(at, "rootFilter and category are exclusive"));
        }
        if let Some(filter) = &collection.root_filter {
            validate_filter(filter, &format!("{}/rootFilter", at), 0)?;
        }
        if let Some(categories) = &collection.category {
            for name in categories {
                check_category(name, &format!("{}/category", at))?;
            }
        }
    }
    Ok(group)
}

fn validate_filter(filter: &Value, path: &str, depth: usize) -> CollectionResult<()> {
    if depth > MAX_DEPTH {
        return Err(CollectionError::schema(path, format!("nested deeper than {}", MAX_DEPTH)));
    }
    let object = as_object(filter, path)?;
    for key in object.keys() {
        if key != "operator" && key != "condition" {
            return Err(CollectionError::schema(path, format!("unexpected key {}", key)));
        }
    }
    let operator = object
        .get("operator")
        .and_then(Value::as_str)
        .ok_or_else(|| CollectionError::schema(path, "operator is required"))?;
    if Operator::from_name(operator).is_none() {
        return Err(CollectionError::schema(path, format!("operator {} is not AND or OR", operator)));
    }
    let Some(condition) = object.get("condition") else {
        return Ok(());
    };
    let path = format!("{}/condition", path);
    for (key, value) in as_object(condition, &path)? {
        let at = format!("{}/{}", path, key);
        match key.as_str() {
            "subFilter" => {
                for (index, sub) in as_array(value, &at)?.iter().enumerate() {
                    validate_filter(sub, &format!("{}/{}", at, index), depth + 1)?;
                }
            }
            "plugin" | "keyword" => {
                for name in strings(value, &at)? {
                    if name.trim().is_empty() {
                        return Err(CollectionError::schema(&at, "empty name"));
                    }
                }
            }
            "signature" => {
                for signature in strings(value, &at)? {
                    if !SIGNATURES.iter().any(|s| s.eq_ignore_ascii_case(signature)) {
                        return Err(CollectionError::schema(&at, format!("unsupported signature {}", signature)));
                    }
                }
            }
            "scope" => {
                for token in strings(value, &at)? {
                    if Scope::from_name(token).is_none() {
                        return Err(CollectionError::schema(&at, format!("unknown scope {}", token)));
                    }
                }
            }
            "category" => {
                for name in strings(value, &at)? {
                    check_category(name, &at)?;
                }
            }
            "formList" => {
                for entry in as_array(value, &at)? {
                    let entry = as_object(entry, &at)?;
                    required_string(entry, "listPlugin", &at)?;
                    check_hex(required_string(entry, "formID", &at)?, &at)?;
                }
            }
            "forms" => {
                for entry in as_array(value, &at)? {
                    let entry = as_object(entry, &at)?;
                    required_string(entry, "plugin", &at)?;
                    let forms = entry
                        .get("form")
                        .ok_or_else(|| CollectionError::schema(&at, "form is required"))?;
                    for id in strings(forms, &at)? {
                        check_hex(id, &at)?;
                    }
                }
            }
            "nameMatch" => {
                let entry = as_object(value, &at)?;
                if let Some(is_npc) = entry.get("isNPC") {
                    if !is_npc.is_boolean() {
                        return Err(CollectionError::schema(&at, "isNPC must be a boolean"));
                    }
                }
                let match_if = required_string(entry, "matchIf", &at)?;
                if MatchIf::from_name(match_if).is_none() {
                    return Err(CollectionError::schema(&at, format!("unknown matchIf {}", match_if)));
                }
                let names = entry
                    .get("names")
                    .ok_or_else(|| CollectionError::schema(&at, "names is required"))?;
                strings(names, &at)?;
            }
            other => {
                return Err(CollectionError::schema(&path, format!("unknown condition {}", other)));
            }
        }
    }
    Ok(())
}

fn as_object<'a>(value: &'a Value, path: &str) -> CollectionResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CollectionError::schema(path, "expected an object"))
}

fn as_array<'a>(value: &'a Value, path: &str) -> CollectionResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| CollectionError::schema(path, "expected an array"))
}

fn strings<'a>(value: &'a Value, path: &str) -> CollectionResult<Vec<&'a str>> {
    as_array(value, path)?
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| CollectionError::schema(path, "expected an array of strings"))
        })
        .collect()
}

fn required_string<'a>(object: &'a Map<String, Value>, key: &str, path: &str) -> CollectionResult<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CollectionError::schema(path, format!("{} must be a string", key)))
}

fn check_hex(text: &str, path: &str) -> CollectionResult<()> {
    FormId::parse_hex(text)
        .map(|_| ())
        .ok_or_else(|| CollectionError::schema(path, format!("{} is not a hex form ID", text)))
}

fn check_category(name: &str, path: &str) -> CollectionResult<()> {
    match ObjectType::from_name(name) {
        ObjectType::Unknown => Err(CollectionError::schema(path, format!("unknown category {}", name))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_with(filter: Value) -> Value {
        json!({
            "groupPolicy": {"action": "take", "notify": true, "repeat": false},
            "useMCM": false,
            "collections": [{"name": "Test", "rootFilter": filter}]
        })
    }

    #[test]
    fn test_valid_group() {
        let document = group_with(json!({"operator": "AND", "condition": {
            "scope": ["deadBody"],
            "subFilter": [{"operator": "OR", "condition": {
                "signature": ["WEAP", "ARMO"],
                "forms": [{"plugin": "Skyrim.esm", "form": ["0001397E"]}],
                "formList": [{"listPlugin": "Skyrim.esm", "formID": "000A0E2B"}],
                "nameMatch": {"isNPC": true, "matchIf": "startsWith", "names": ["Draugr"]}
            }}]
        }}));
        let group = validate_group(&document, "coins.json").unwrap();
        assert_eq!(group.collections.len(), 1);
        assert!(!group.use_mcm);
    }

    #[test]
    fn test_rejects_bad_tokens() {
        let cases = [
            json!({"operator": "XOR"}),
            json!({"operator": "OR", "condition": {"signature": ["NPC_"]}}),
            json!({"operator": "OR", "condition": {"scope": ["inventory"]}}),
            json!({"operator": "OR", "condition": {"forms": [{"plugin": "A.esp", "form": ["xyz"]}]}}),
            json!({"operator": "OR", "condition": {"nameMatch": {"matchIf": "like", "names": []}}}),
            json!({"operator": "OR", "condition": {"colour": ["red"]}}),
            json!({"operator": "OR", "condition": {}, "extra": 1}),
        ];
        for filter in cases {
            let err = validate_group(&group_with(filter.clone()), "bad.json").unwrap_err();
            assert!(matches!(err, CollectionError::Schema { .. }), "accepted {}", filter);
        }
    }

    #[test]
    fn test_exclusive_filters() {
        let document = json!({"collections": [{
            "name": "Both",
            "rootFilter": {"operator": "OR"},
            "category": ["gem"]
        }]});
        assert!(validate_group(&document, "both.json").is_err());

        let document = json!({"collections": [{"name": "Gems", "category": ["gems"]}]});
        assert!(validate_group(&document, "gems.json").is_err());
    }

    #[test]
    fn test_discard_action_accepted() {
        let document = json!({"collections": [{
            "name": "Gems",
            "category": ["gem"],
            "policy": {"action": "discard"}
        }]});
        let group = validate_group(&document, "gems.json").unwrap();
        assert_eq!(group.collections.len(), 1);
    }

    #[test]
    fn test_unknown_top_level_key() {
        let document = json!({"collections": [], "version": 2});
        assert!(validate_group(&document, "v.json").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut filter = json!({"operator": "OR"});
        for _ in 0..=MAX_DEPTH {
            filter = json!({"operator": "AND", "condition": {"subFilter": [filter]}});
        }
        assert!(validate_group(&group_with(filter), "deep.json").is_err());
    }
}
