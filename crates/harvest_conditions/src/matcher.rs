//! Match context handed to every predicate

use std::cell::Cell;

use harvest_core::{Form, ObjectType};
use serde::{Deserialize, Serialize};

/// Physical context an item was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    DeadBody,
    Container,
    LooseItem,
}

impl Scope {
    /// All scopes
    pub const ALL: [Scope; 3] = [Scope::DeadBody, Scope::Container, Scope::LooseItem];

    /// Token used in definition files
    pub fn name(&self) -> &'static str {
        match self {
            Scope::DeadBody => "deadBody",
            Scope::Container => "container",
            Scope::LooseItem => "looseItem",
        }
    }

    /// Parse a definition token
    pub fn from_name(name: &str) -> Option<Scope> {
        Scope::ALL.iter().copied().find(|scope| scope.name().eq_ignore_ascii_case(name))
    }
}

/// One candidate under evaluation
///
/// Built per evaluation and never shared across threads. The evaluation
/// scope is memoized in a `Cell`: the first scope predicate that runs
/// without one back-fills it from where the item was found.
#[derive(Debug)]
pub struct ConditionMatcher<'a> {
    target: &'a Form,
    object_type: ObjectType,
    found_in: Option<Scope>,
    scope: Cell<Option<Scope>>,
    owner_name: Option<&'a str>,
    membership_probe: bool,
}

impl<'a> ConditionMatcher<'a> {
    /// Create a matcher for a candidate form
    pub fn new(target: &'a Form) -> Self {
        Self {
            target,
            object_type: ObjectType::Unknown,
            found_in: None,
            scope: Cell::new(None),
            owner_name: None,
            membership_probe: false,
        }
    }

    /// Matcher used to resolve static membership at data load. Scope
    /// restrictions are deferred to collection time, so every scope passes.
    pub fn membership_probe(target: &'a Form, object_type: ObjectType) -> Self {
        Self {
            membership_probe: true,
            ..Self::new(target).with_object_type(object_type)
        }
    }

    /// Set the resolved object type
    pub fn with_object_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = object_type;
        self
    }

    /// Record where the item was found; the scope is derived lazily
    pub fn found_in(mut self, scope: Scope) -> Self {
        self.found_in = Some(scope);
        self
    }

    /// Set the evaluation scope up front
    pub fn with_scope(self, scope: Scope) -> Self {
        self.scope.set(Some(scope));
        self
    }

    /// Name of the actor or container holding the item
    pub fn with_owner_name(mut self, name: &'a str) -> Self {
        self.owner_name = Some(name);
        self
    }

    /// The candidate form
    pub fn target(&self) -> &'a Form {
        self.target
    }

    /// Resolved object type of the candidate
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Current evaluation scope, if set
    pub fn scope(&self) -> Option<Scope> {
        self.scope.get()
    }

    /// Evaluation scope, back-filling it from the find location on first use
    pub fn resolve_scope(&self) -> Option<Scope> {
        if let Some(scope) = self.scope.get() {
            return Some(scope);
        }
        let derived = self.found_in?;
        self.scope.set(Some(derived));
        Some(derived)
    }

    /// Name of the holding actor/container
    pub fn owner_name(&self) -> Option<&'a str> {
        self.owner_name
    }

    /// True while resolving load-time membership
    pub fn is_membership_probe(&self) -> bool {
        self.membership_probe
    }
}
