pub mod loader;
pub mod rule;

pub use loader::{RuleLoader, RuleLoaderBuilder, rule_candidates};
pub use rule::SiteRule;
