use super::{classify_bands, conclude};
use crate::template::Binding;
use crate::thresholds::select_thresholds;
use crate::Evaluate;
use metriage_common::format::human_integer;
use metriage_common::types::{EvaluationResult, LoadLevel, Status};
use metriage_metrics::MetricStore;
use metriage_rules::model::GaugeConfig;
use metriage_rules::Rule;

impl Evaluate for GaugeConfig {
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.metric_name);
        if rule.metric_name.is_empty() {
            result.message = "Metric name not specified".to_string();
            return result;
        }

        let Some(value) = store
            .get_non_empty(&rule.metric_name)
            .and_then(|m| m.single_value())
        else {
            result.message = format!("Metric {} not found", rule.metric_name);
            return result;
        };
        result.value = value;

        let thresholds = select_thresholds(rule, load_level);
        let status = if !thresholds.higher_is_worse && thresholds.low == 0.0 && thresholds.high == 0.0
        {
            // existence check
            if value > 0.0 {
                Status::Green
            } else {
                Status::Red
            }
        } else {
            classify_bands(value, &thresholds)
        };

        conclude(
            &mut result,
            rule,
            status,
            vec![
                ("value", Binding::Number(value)),
                ("value_human", Binding::Text(human_integer(value))),
            ],
        );
        result
    }
}
