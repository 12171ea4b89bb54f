//! Declarative health rules.
//!
//! Rules are authored as one TOML file per rule, loaded once per run with
//! [`loader::load_rules`] and validated fail-fast: a single invalid file
//! aborts loading of the whole set. The typed [`model::Rule`] carries exactly
//! one kind-specific configuration through [`model::RuleKind`], so an
//! evaluation never sees a rule whose type and config disagree.

pub mod error;
pub mod loader;
pub mod model;
pub mod validator;
pub mod version;

pub use model::{
    CompareOp, LoadDetectionRule, LoadLevelThresholds, Messages, Remediation, Rule, RuleKind,
    RuleType, Thresholds,
};
