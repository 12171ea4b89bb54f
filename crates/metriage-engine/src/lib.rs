//! Health rule evaluation over a single metrics snapshot.
//!
//! Each rule kind implements [`Evaluate`]. The [`analyzer`] drives a whole
//! run: it filters rules by product version, evaluates them in list order,
//! applies [`correlation`], and appends the [`overflow`] check for every
//! histogram found in the snapshot. Missing data never fails a run; the
//! affected rule reports GREEN with an explanatory message instead.

pub mod analyzer;
pub mod correlation;
pub mod error;
pub mod evaluators;
pub mod load_level;
pub mod overflow;
pub mod template;
pub mod thresholds;

#[cfg(test)]
mod tests;

use metriage_common::types::{EvaluationResult, LoadLevel};
use metriage_metrics::MetricStore;
use metriage_rules::Rule;

/// Evaluation capability of one rule kind.
///
/// Implementations read the store and never fail: absent metrics, empty
/// series and zero denominators produce an informational GREEN result.
pub trait Evaluate {
    /// Evaluates `rule` against `store` using the thresholds active at `load_level`.
    fn evaluate(&self, rule: &Rule, store: &MetricStore, load_level: LoadLevel)
        -> EvaluationResult;
}
