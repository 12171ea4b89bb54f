use super::{classify_higher_is_worse, conclude};
use crate::template::Binding;
use crate::thresholds::select_thresholds;
use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel};
use metriage_metrics::MetricStore;
use metriage_rules::model::PercentageConfig;
use metriage_rules::Rule;

const DEFAULT_ZERO_ACTIVITY: &str = "No activity yet (denominator is zero)";

impl Evaluate for PercentageConfig {
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.display_name);

        let Some(numerator) = store
            .get_non_empty(&self.numerator)
            .and_then(|m| m.single_value())
        else {
            result.message = format!("Numerator metric {} not found", self.numerator);
            return result;
        };
        let Some(denominator) = store
            .get_non_empty(&self.denominator)
            .and_then(|m| m.single_value())
        else {
            result.message = format!("Denominator metric {} not found", self.denominator);
            return result;
        };

        if denominator == 0.0 {
            result.message = if rule.messages.zero_activity.is_empty() {
                DEFAULT_ZERO_ACTIVITY.to_string()
            } else {
                rule.messages.zero_activity.clone()
            };
            return result;
        }

        let percentage = numerator / denominator * 100.0;
        result.value = percentage;

        let thresholds = select_thresholds(rule, load_level);
        let status = classify_higher_is_worse(percentage, thresholds.low, thresholds.high);
        conclude(
            &mut result,
            rule,
            status,
            vec![
                ("value", Binding::Number(percentage)),
                ("numerator", Binding::Number(numerator)),
                ("denominator", Binding::Number(denominator)),
            ],
        );
        result
    }
}
