use super::{classify_higher_is_better, conclude};
use crate::template::Binding;
use crate::thresholds::select_thresholds;
use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel};
use metriage_metrics::MetricStore;
use metriage_rules::model::CacheConfig;
use metriage_rules::Rule;

const DEFAULT_ZERO_ACTIVITY: &str = "No cache activity yet (0 hits, 0 misses)";

impl Evaluate for CacheConfig {
    /// Hit rate in percent. Always classified higher-is-better; the rule's
    /// `higher_is_worse` flag is not consulted.
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.display_name);

        let Some(hits) = store
            .get_non_empty(&self.hits_metric)
            .and_then(|m| m.single_value())
        else {
            result.message = format!("Hits metric {} not found", self.hits_metric);
            return result;
        };
        let Some(misses) = store
            .get_non_empty(&self.misses_metric)
            .and_then(|m| m.single_value())
        else {
            result.message = format!("Misses metric {} not found", self.misses_metric);
            return result;
        };

        let total = hits + misses;
        if total == 0.0 {
            result.message = if rule.messages.zero_activity.is_empty() {
                DEFAULT_ZERO_ACTIVITY.to_string()
            } else {
                rule.messages.zero_activity.clone()
            };
            return result;
        }

        let hit_rate = hits / total * 100.0;
        result.value = hit_rate;

        let thresholds = select_thresholds(rule, load_level);
        let status = classify_higher_is_better(hit_rate, thresholds.low, thresholds.high);
        conclude(
            &mut result,
            rule,
            status,
            vec![
                ("value", Binding::Number(hit_rate)),
                ("hits", Binding::Number(hits)),
                ("misses", Binding::Number(misses)),
            ],
        );
        result
    }
}
