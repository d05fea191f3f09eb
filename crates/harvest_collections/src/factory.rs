//! Builds collections and groups from definitions

use harvest_conditions::ConditionTree;
use harvest_core::{FormStore, ObjectType};
use serde::Deserialize;
use serde_json::Value;

use crate::collection::{Collection, CollectionFilter};
use crate::definition::{CollectionDefinition, GroupDefinition};
use crate::error::{CollectionError, CollectionResult};
use crate::group::CollectionGroup;
use crate::policy::CollectionPolicy;

/// Build one collection. A `policy` in the definition overrides the
/// group default and marks the collection as overriding.
pub fn parse_collection(
    group: &str,
    definition: &Value,
    default_policy: &CollectionPolicy,
    store: &dyn FormStore,
) -> CollectionResult<Collection> {
    let definition = CollectionDefinition::deserialize(definition)?;
    build_collection(group, &definition, default_policy, store)
}

/// Build a group from its definition. A collection that fails to build is
/// logged and skipped; the rest of the group still loads.
pub fn parse_group(name: &str, definition: &Value, store: &dyn FormStore) -> CollectionResult<CollectionGroup> {
    let definition = GroupDefinition::deserialize(definition)?;
    Ok(build_group(name, &definition, store))
}

pub(crate) fn build_group(name: &str, definition: &GroupDefinition, store: &dyn FormStore) -> CollectionGroup {
    let mut group = CollectionGroup::new(name, definition.group_policy, definition.use_mcm);
    for collection in &definition.collections {
        match build_collection(name, collection, &definition.group_policy, store) {
            Ok(built) => {
                if !group.add(built) {
                    log::error!(
                        "{}",
                        CollectionError::DuplicateName(format!("{}/{}", name, collection.name))
                    );
                }
            }
            Err(e) => log::error!("Skipping collection {}/{}: {}", name, collection.name, e),
        }
    }
    log::info!("Collection group {}: {} collections", name, group.len());
    group
}

fn build_collection(
    group: &str,
    definition: &CollectionDefinition,
    default_policy: &CollectionPolicy,
    store: &dyn FormStore,
) -> CollectionResult<Collection> {
    let filter = match (&definition.root_filter, &definition.category) {
        (Some(root), _) => CollectionFilter::Tree(ConditionTree::parse(root, store)?),
        (None, Some(names)) => {
            let mut categories = Vec::new();
            for name in names {
                match ObjectType::from_name(name) {
                    ObjectType::Unknown => log::debug!("Dropping unknown category {}", name),
                    category if !categories.contains(&category) => categories.push(category),
                    _ => {}
                }
            }
            CollectionFilter::Category(categories)
        }
        (None, None) => {
            return Err(CollectionError::MissingFilter {
                name: format!("{}/{}", group, definition.name),
            })
        }
    };
    let (policy, overrides_group) = match definition.policy {
        Some(policy) => (policy, true),
        None => (*default_policy, false),
    };
    Ok(Collection::new(
        definition.name.clone(),
        definition.description.clone(),
        policy,
        overrides_group,
        filter,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CollectibleHandling;
    use harvest_core::{Form, FormId, FormType, LoadOrder, MemoryFormStore};
    use serde_json::json;

    fn store() -> MemoryFormStore {
        MemoryFormStore::new(LoadOrder::from_names(["Skyrim.esm"]).unwrap())
            .with_form(Form::new(FormId::new(0x300), FormType::Keyword).with_editor_id("VendorItemGem"))
            .with_form(Form::new(FormId::new(0x40), FormType::Misc))
    }

    #[test]
    fn test_policy_override() {
        let store = store();
        let default = CollectionPolicy::default();
        let plain = parse_collection(
            "Treasure",
            &json!({"name": "Gems", "category": ["gem"]}),
            &default,
            &store,
        )
        .unwrap();
        assert!(!plain.overrides_group());
        assert_eq!(plain.policy(), &default);

        let own = parse_collection(
            "Treasure",
            &json!({"name": "Gems", "category": ["gem"], "policy": {"action": "print"}}),
            &default,
            &store,
        )
        .unwrap();
        assert!(own.overrides_group());
        assert_eq!(own.policy().action, CollectibleHandling::Print);
    }

    #[test]
    fn test_static_members_seeded() {
        let store = store();
        let collection = parse_collection(
            "Treasure",
            &json!({"name": "Statue", "rootFilter": {"operator": "OR", "condition": {
                "forms": [{"plugin": "Skyrim.esm", "form": ["00000040"]}]
            }}}),
            &CollectionPolicy::default(),
            &store,
        )
        .unwrap();
        assert!(collection.is_member_of(FormId::new(0x40)));
    }

    #[test]
    fn test_missing_filter() {
        let err = parse_collection("Treasure", &json!({"name": "Empty"}), &CollectionPolicy::default(), &store())
            .unwrap_err();
        assert!(matches!(err, CollectionError::MissingFilter { .. }));
    }

    #[test]
    fn test_group_skips_bad_collections() {
        let store = store();
        let group = parse_group(
            "Treasure",
            &json!({"groupPolicy": {"notify": false}, "useMCM": true, "collections": [
                {"name": "Gems", "rootFilter": {"operator": "OR", "condition": {"keyword": ["VendorItemGem"]}}},
                {"name": "Dragons", "rootFilter": {"operator": "OR", "condition": {"keyword": ["VendorItemDragon"]}}},
                {"name": "Mods", "rootFilter": {"operator": "OR", "condition": {"plugin": ["Missing.esp"]}}},
                {"name": "Gems", "category": ["gem"]}
            ]}),
            &store,
        )
        .unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.use_mcm());
        assert!(!group.collection("Gems").unwrap().policy().notify);
    }
}
