//! AND/OR condition trees
//!
//! Definition shape:
//!
//! ```json
//! { "operator": "AND",
//!   "condition": { "subFilter": [ ... ], "plugin": [ ... ], "formList": [ ... ],
//!                  "forms": [ ... ], "keyword": [ ... ], "signature": [ ... ],
//!                  "scope": [ ... ], "category": [ ... ], "nameMatch": { ... } } }
//! ```
//!
//! Children keep their declared order: keys in document order, then array
//! order within a key.

use std::collections::HashSet;

use harvest_core::{FormId, FormStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::{
    CategoryCondition, Condition, FormListCondition, FormsCondition, Fragment, KeywordCondition,
    MatchIf, NameMatchCondition, PluginCondition, ScopeCondition, SignatureCondition,
};
use crate::error::{ConditionError, ConditionResult};
use crate::matcher::{ConditionMatcher, Scope};

/// Deepest `subFilter` nesting accepted from a definition file
pub const MAX_DEPTH: usize = 16;

/// Boolean combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Operator {
    /// Definition token
    pub fn name(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }

    /// Parse a definition token
    pub fn from_name(name: &str) -> Option<Operator> {
        if name.eq_ignore_ascii_case("AND") {
            Some(Operator::And)
        } else if name.eq_ignore_ascii_case("OR") {
            Some(Operator::Or)
        } else {
            None
        }
    }
}

/// Recursive AND/OR node
#[derive(Debug, Clone)]
pub struct ConditionTree {
    operator: Operator,
    children: Vec<Condition>,
    depth: usize,
}

impl ConditionTree {
    /// Create an empty tree
    pub fn new(operator: Operator) -> Self {
        Self::at_depth(operator, 0)
    }

    fn at_depth(operator: Operator, depth: usize) -> Self {
        Self {
            operator,
            children: Vec::new(),
            depth,
        }
    }

    /// Append a child
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.push(condition);
        self
    }

    /// Append a child; nested trees are re-levelled under this one
    pub fn push(&mut self, condition: Condition) {
        let condition = match condition {
            Condition::Tree(mut tree) => {
                tree.set_depth(self.depth + 1);
                Condition::Tree(tree)
            }
            other => other,
        };
        self.children.push(condition);
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            if let Condition::Tree(tree) = child {
                tree.set_depth(depth + 1);
            }
        }
    }

    /// Combinator
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Children in declared order
    pub fn children(&self) -> &[Condition] {
        &self.children
    }

    /// Nesting level, 0 at the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Evaluate with short-circuit. An empty AND is true, an empty OR false.
    pub fn evaluate(&self, matcher: &ConditionMatcher<'_>) -> bool {
        match self.operator {
            Operator::And => self.children.iter().all(|child| child.evaluate(matcher)),
            Operator::Or => self.children.iter().any(|child| child.evaluate(matcher)),
        }
    }

    /// Union of the children's static members
    pub fn static_members(&self) -> HashSet<FormId> {
        let mut members = HashSet::new();
        for child in &self.children {
            members.extend(child.static_members());
        }
        members
    }

    /// Scopes every match must fall in, or `None` when any scope can match.
    /// AND intersects the requirements of its children; OR unions them,
    /// and is unrestricted as soon as one child is.
    pub fn required_scopes(&self) -> Option<HashSet<Scope>> {
        let mut child_scopes = self.children.iter().map(|child| match child {
            Condition::Scope(scope) => Some(scope.scopes().iter().copied().collect::<HashSet<Scope>>()),
            Condition::Tree(tree) => tree.required_scopes(),
            _ => None,
        });
        match self.operator {
            Operator::And => child_scopes.flatten().reduce(|a, b| a.intersection(&b).copied().collect()),
            Operator::Or => {
                let mut union: Option<HashSet<Scope>> = None;
                for scopes in child_scopes.by_ref() {
                    let scopes = scopes?;
                    union.get_or_insert_with(HashSet::new).extend(scopes);
                }
                union
            }
        }
    }

    /// Whether a scope condition appears anywhere in the tree
    pub fn has_scope_condition(&self) -> bool {
        self.children.iter().any(|child| match child {
            Condition::Scope(_) => true,
            Condition::Tree(tree) => tree.has_scope_condition(),
            _ => false,
        })
    }

    /// Parse a definition
    pub fn parse(definition: &Value, store: &dyn FormStore) -> ConditionResult<Self> {
        Self::parse_at(definition, store, 0)
    }

    /// Parse definition text
    pub fn parse_str(text: &str, store: &dyn FormStore) -> ConditionResult<Self> {
        let definition: Value = serde_json::from_str(text)?;
        Self::parse(&definition, store)
    }

    fn parse_at(definition: &Value, store: &dyn FormStore, depth: usize) -> ConditionResult<Self> {
        if depth > MAX_DEPTH {
            return Err(ConditionError::Parse(format!("subFilter nesting deeper than {}", MAX_DEPTH)));
        }
        let operator = definition
            .get("operator")
            .and_then(Value::as_str)
            .and_then(Operator::from_name)
            .ok_or_else(|| ConditionError::Parse("operator must be AND or OR".to_string()))?;

        let mut tree = Self::at_depth(operator, depth);
        let Some(condition) = definition.get("condition") else {
            return Ok(tree);
        };
        let condition = condition
            .as_object()
            .ok_or_else(|| ConditionError::Parse("condition must be an object".to_string()))?;

        for (key, value) in condition {
            match key.as_str() {
                "subFilter" => {
                    for sub in as_array(key, value)? {
                        let subtree = Self::parse_at(sub, store, depth + 1)?;
                        tree.children.push(Condition::Tree(subtree));
                    }
                }
                "plugin" => {
                    let names = string_list(key, value)?;
                    tree.children.push(Condition::Plugin(PluginCondition::new(names, store)?));
                }
                "formList" => {
                    for entry in as_array(key, value)? {
                        let plugin = string_field(entry, "listPlugin")?;
                        let local = hex_field(entry, "formID")?;
                        tree.children
                            .push(Condition::FormList(FormListCondition::new(plugin, local, store)));
                    }
                }
                "forms" => {
                    for entry in as_array(key, value)? {
                        let plugin = string_field(entry, "plugin")?;
                        let ids = entry
                            .get("form")
                            .map(|forms| string_list("form", forms))
                            .transpose()?
                            .unwrap_or_default();
                        let locals = ids
                            .iter()
                            .map(|id| parse_local_id(id))
                            .collect::<ConditionResult<Vec<u32>>>()?;
                        tree.children
                            .push(Condition::Forms(FormsCondition::new(plugin, locals, store)));
                    }
                }
                "keyword" => {
                    let names = string_list(key, value)?;
                    tree.children.push(Condition::Keyword(KeywordCondition::new(names, store)?));
                }
                "signature" => {
                    let signatures = string_list(key, value)?;
                    tree.children.push(Condition::Signature(SignatureCondition::new(signatures)));
                }
                "scope" => {
                    let scopes = string_list(key, value)?;
                    tree.children.push(Condition::Scope(ScopeCondition::new(scopes)));
                }
                "category" => {
                    let names = string_list(key, value)?;
                    tree.children.push(Condition::Category(CategoryCondition::new(names)));
                }
                "nameMatch" => {
                    let is_npc = value.get("isNPC").and_then(Value::as_bool).unwrap_or(false);
                    let token = string_field(value, "matchIf")?;
                    let match_if = MatchIf::from_name(&token)
                        .ok_or_else(|| ConditionError::Parse(format!("unknown matchIf {}", token)))?;
                    let names = value
                        .get("names")
                        .map(|names| string_list("names", names))
                        .transpose()?
                        .unwrap_or_default();
                    tree.children
                        .push(Condition::NameMatch(NameMatchCondition::new(is_npc, match_if, names)));
                }
                other => log::debug!("Ignoring unrecognized condition key {}", other),
            }
        }
        Ok(tree)
    }

    /// Serialize to the definition shape
    pub fn to_json(&self) -> Value {
        let mut condition = Map::new();
        let mut overflow = ConditionTree::at_depth(self.operator, self.depth + 1);

        for child in &self.children {
            match child.fragment() {
                Fragment::Element(key, value) => {
                    let slot = condition
                        .entry(key.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(items) = slot {
                        items.push(value);
                    }
                }
                Fragment::Whole(key, value) => {
                    if condition.contains_key(key) {
                        // A second predicate of the same kind cannot share the key;
                        // nest it under the same operator, which evaluates the same.
                        overflow.children.push(child.clone());
                    } else {
                        condition.insert(key.to_string(), value);
                    }
                }
            }
        }

        if !overflow.children.is_empty() {
            let slot = condition
                .entry("subFilter".to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(overflow.to_json());
            }
        }

        let mut root = Map::new();
        root.insert("operator".to_string(), Value::String(self.operator.name().to_string()));
        root.insert("condition".to_string(), Value::Object(condition));
        Value::Object(root)
    }
}

fn as_array<'v>(key: &str, value: &'v Value) -> ConditionResult<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ConditionError::Parse(format!("{} must be an array", key)))
}

fn string_list(key: &str, value: &Value) -> ConditionResult<Vec<String>> {
    as_array(key, value)?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ConditionError::Parse(format!("{} entries must be strings", key)))
        })
        .collect()
}

fn string_field(value: &Value, field: &str) -> ConditionResult<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConditionError::Parse(format!("missing string field {}", field)))
}

fn hex_field(value: &Value, field: &str) -> ConditionResult<u32> {
    parse_local_id(&string_field(value, field)?)
}

fn parse_local_id(text: &str) -> ConditionResult<u32> {
    FormId::parse_hex(text)
        .map(|id| id.raw())
        .ok_or_else(|| ConditionError::Parse(format!("invalid form ID {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{Form, FormType, LoadOrder, MemoryFormStore};
    use serde_json::json;

    fn store() -> MemoryFormStore {
        MemoryFormStore::new(LoadOrder::from_names(["Skyrim.esm"]).unwrap())
            .with_form(Form::new(FormId::new(0x10), FormType::Weapon).with_name("Iron Sword"))
            .with_form(Form::new(FormId::new(0x11), FormType::Misc).with_name("Bowl"))
    }

    #[test]
    fn test_empty_and_is_true() {
        let form = Form::new(FormId::new(1), FormType::Misc);
        let tree = ConditionTree::new(Operator::And);
        assert!(tree.evaluate(&ConditionMatcher::new(&form)));
    }

    #[test]
    fn test_empty_or_is_false() {
        let form = Form::new(FormId::new(1), FormType::Misc);
        let tree = ConditionTree::new(Operator::Or);
        assert!(!tree.evaluate(&ConditionMatcher::new(&form)));
    }

    #[test]
    fn test_parse_signature_or() {
        let store = store();
        let tree = ConditionTree::parse(
            &json!({"operator": "OR", "condition": {"signature": ["WEAP"]}}),
            &store,
        )
        .unwrap();
        let sword = store.lookup_form(FormId::new(0x10)).unwrap();
        let bowl = store.lookup_form(FormId::new(0x11)).unwrap();
        assert!(tree.evaluate(&ConditionMatcher::new(&sword)));
        assert!(!tree.evaluate(&ConditionMatcher::new(&bowl)));
    }

    #[test]
    fn test_parse_preserves_declared_order() {
        let store = store();
        let tree = ConditionTree::parse(
            &json!({"operator": "AND", "condition": {
                "scope": ["looseItem"],
                "signature": ["MISC"],
                "subFilter": [{"operator": "OR", "condition": {}}]
            }}),
            &store,
        )
        .unwrap();
        assert!(matches!(tree.children()[0], Condition::Scope(_)));
        assert!(matches!(tree.children()[1], Condition::Signature(_)));
        match &tree.children()[2] {
            Condition::Tree(sub) => assert_eq!(sub.depth(), 1),
            other => panic!("expected subtree, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_operator() {
        let store = store();
        let err = ConditionTree::parse(&json!({"operator": "XOR"}), &store).unwrap_err();
        assert!(matches!(err, ConditionError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let store = store();
        let mut definition = json!({"operator": "AND", "condition": {}});
        for _ in 0..=MAX_DEPTH {
            definition = json!({"operator": "AND", "condition": {"subFilter": [definition]}});
        }
        assert!(ConditionTree::parse(&definition, &store).is_err());
    }

    #[test]
    fn test_required_scopes() {
        let store = store();
        let and_tree = ConditionTree::parse(
            &json!({"operator": "AND", "condition": {"scope": ["deadBody", "container"]}}),
            &store,
        )
        .unwrap();
        let required = and_tree.required_scopes().unwrap();
        assert!(required.contains(&Scope::DeadBody));
        assert!(!required.contains(&Scope::LooseItem));

        let or_tree = ConditionTree::parse(
            &json!({"operator": "OR", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}}),
            &store,
        )
        .unwrap();
        assert!(or_tree.required_scopes().is_none());
        assert!(or_tree.has_scope_condition());
    }

    #[test]
    fn test_required_scopes_nested() {
        let store = store();
        let nested = ConditionTree::parse(
            &json!({"operator": "AND", "condition": {"subFilter": [
                {"operator": "AND", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}}
            ]}}),
            &store,
        )
        .unwrap();
        assert!(nested.has_scope_condition());
        assert_eq!(nested.required_scopes(), Some(HashSet::from([Scope::DeadBody])));

        let either = ConditionTree::parse(
            &json!({"operator": "OR", "condition": {"subFilter": [
                {"operator": "AND", "condition": {"scope": ["deadBody"], "signature": ["WEAP"]}},
                {"operator": "AND", "condition": {"scope": ["container"], "signature": ["ARMO"]}}
            ]}}),
            &store,
        )
        .unwrap();
        assert_eq!(
            either.required_scopes(),
            Some(HashSet::from([Scope::DeadBody, Scope::Container]))
        );

        let unscoped = ConditionTree::parse(
            &json!({"operator": "AND", "condition": {"signature": ["WEAP"]}}),
            &store,
        )
        .unwrap();
        assert!(!unscoped.has_scope_condition());
        assert!(unscoped.required_scopes().is_none());
    }

    #[test]
    fn test_overflow_serializes_as_subfilter() {
        let tree = ConditionTree::new(Operator::And)
            .with_condition(Condition::Signature(SignatureCondition::new(["WEAP"])))
            .with_condition(Condition::Signature(SignatureCondition::new(["MISC"])));
        let json = tree.to_json();
        assert_eq!(json["condition"]["signature"], json!(["WEAP"]));
        assert_eq!(json["condition"]["subFilter"][0]["operator"], "AND");
        assert_eq!(json["condition"]["subFilter"][0]["condition"]["signature"], json!(["MISC"]));
    }
}
