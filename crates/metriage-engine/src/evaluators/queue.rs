use super::{classify_higher_is_worse, conclude};
use crate::template::Binding;
use crate::thresholds::select_thresholds;
use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel};
use metriage_metrics::MetricStore;
use metriage_rules::model::QueueConfig;
use metriage_rules::Rule;

impl Evaluate for QueueConfig {
    /// Net growth of a queue: `add - remove` from the samples labelled with
    /// the configured operations. Missing operations count as zero.
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.metric_name);

        let Some(metric) = store.get_non_empty(&rule.metric_name) else {
            result.message = format!("Metric {} not found", rule.metric_name);
            return result;
        };

        let by_operation = metric.values_by_label(&self.operation_label);
        let added = by_operation.get(&self.add_value).copied().unwrap_or(0.0);
        let removed = by_operation.get(&self.remove_value).copied().unwrap_or(0.0);
        let diff = added - removed;
        result.value = diff;

        let thresholds = select_thresholds(rule, load_level);
        let status = classify_higher_is_worse(diff, thresholds.low, thresholds.high);
        conclude(
            &mut result,
            rule,
            status,
            vec![
                ("value", Binding::Number(diff)),
                ("add", Binding::Number(added)),
                ("remove", Binding::Number(removed)),
                ("diff", Binding::Number(diff)),
            ],
        );
        result
    }
}
