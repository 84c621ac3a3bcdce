//! Tag decision logic: rule parsing, target tag resolution and
//! mutation planning.

mod reconciler;
mod resolver;
mod rules;

pub use reconciler::{has_removable_tags, plan_mutation, MutationPlan};
pub use resolver::{ResolutionPolicy, TagResolver};
pub use rules::{Rule, RuleTable};
