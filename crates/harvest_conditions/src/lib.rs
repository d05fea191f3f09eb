//! Harvest Conditions - Rule Evaluation
//!
//! Boolean rules that decide whether a candidate form belongs to a
//! collection.
//!
//! # Features
//!
//! - Leaf predicates over plugin, form list, explicit forms, keywords,
//!   record signature, scope, category and name
//! - AND/OR trees with short-circuit evaluation
//! - JSON parse/serialize round trip
//!
//! # Example
//!
//! ```ignore
//! use harvest_conditions::prelude::*;
//!
//! let tree = ConditionTree::parse(&json!({
//!     "operator": "OR",
//!     "condition": { "signature": ["WEAP"] }
//! }), &store)?;
//!
//! let matcher = ConditionMatcher::new(&sword);
//! assert!(tree.evaluate(&matcher));
//! ```

pub mod condition;
pub mod error;
pub mod matcher;
pub mod tree;

pub mod prelude {
    pub use crate::condition::{
        CategoryCondition, Condition, FormListCondition, FormsCondition, KeywordCondition, MatchIf,
        NameMatchCondition, PluginCondition, ScopeCondition, SignatureCondition,
    };
    pub use crate::error::{ConditionError, ConditionResult};
    pub use crate::matcher::{ConditionMatcher, Scope};
    pub use crate::tree::{ConditionTree, Operator};
}

pub use prelude::*;
