//! Collection groups
//!
//! One group per definition file. The group policy is the default for
//! every collection that does not bring its own.

use crate::collection::Collection;
use crate::policy::CollectionPolicy;

/// Collections loaded from one file
#[derive(Debug)]
pub struct CollectionGroup {
    name: String,
    policy: CollectionPolicy,
    use_mcm: bool,
    collections: Vec<Collection>,
}

impl CollectionGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>, policy: CollectionPolicy, use_mcm: bool) -> Self {
        Self {
            name: name.into(),
            policy,
            use_mcm,
            collections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default policy
    pub fn policy(&self) -> &CollectionPolicy {
        &self.policy
    }

    /// Editable from the settings menu
    pub fn use_mcm(&self) -> bool {
        self.use_mcm
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Look up a collection by name
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name() == name)
    }

    /// Add a collection; names are unique within a group
    pub fn add(&mut self, collection: Collection) -> bool {
        if self.collection(collection.name()).is_some() {
            return false;
        }
        self.collections.push(collection);
        true
    }

    /// Change the default policy and push it to every collection that
    /// does not override it
    pub fn sync_default_policy(&mut self, policy: CollectionPolicy) {
        self.policy = policy;
        for collection in self.collections.iter_mut().filter(|c| !c.overrides_group()) {
            collection.set_policy(policy);
        }
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionFilter;
    use crate::policy::CollectibleHandling;
    use harvest_core::ObjectType;

    fn gems(overrides: bool, policy: CollectionPolicy) -> Collection {
        Collection::new("Gems", "", policy, overrides, CollectionFilter::Category(vec![ObjectType::Gem]))
    }

    #[test]
    fn test_sync_skips_overrides() {
        let mut group = CollectionGroup::new("Treasure", CollectionPolicy::default(), true);
        let own = CollectionPolicy::new(CollectibleHandling::Glow, false, true);
        group.add(gems(true, own));
        group.add(Collection::new(
            "Ingots",
            "",
            CollectionPolicy::default(),
            false,
            CollectionFilter::Category(vec![ObjectType::OreIngot]),
        ));

        let quiet = CollectionPolicy::new(CollectibleHandling::Print, false, false);
        group.sync_default_policy(quiet);
        assert_eq!(group.policy(), &quiet);
        assert_eq!(group.collection("Gems").unwrap().policy(), &own);
        assert_eq!(group.collection("Ingots").unwrap().policy(), &quiet);
    }

    #[test]
    fn test_unique_names() {
        let mut group = CollectionGroup::new("Treasure", CollectionPolicy::default(), false);
        assert!(group.add(gems(false, CollectionPolicy::default())));
        assert!(!group.add(gems(false, CollectionPolicy::default())));
        assert_eq!(group.len(), 1);
    }
}
