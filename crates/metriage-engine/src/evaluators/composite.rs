use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel, Status};
use metriage_metrics::MetricStore;
use metriage_rules::model::{CheckType, CompositeCheck, CompositeConfig};
use metriage_rules::Rule;

/// Named source values in configuration order.
type NamedValues = Vec<(String, f64)>;

fn lookup(values: &NamedValues, name: &str) -> Option<f64> {
    values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
}

fn check_matches(check: &CompositeCheck, values: &NamedValues) -> bool {
    match check.check_type {
        CheckType::NotZero => check
            .metrics
            .iter()
            .any(|name| lookup(values, name) == Some(0.0)),
        CheckType::Ratio => {
            match (
                lookup(values, &check.numerator),
                lookup(values, &check.denominator),
            ) {
                (Some(numerator), Some(denominator)) if denominator != 0.0 => {
                    numerator / denominator < check.min_ratio
                }
                _ => false,
            }
        }
        CheckType::Unknown => false,
    }
}

/// Replaces each literal `{name}` with the value rounded to an integer.
fn interpolate(template: &str, values: &NamedValues) -> String {
    values.iter().fold(template.to_string(), |message, (name, value)| {
        message.replace(&format!("{{{name}}}"), &format!("{value:.0}"))
    })
}

impl Evaluate for CompositeConfig {
    fn evaluate(&self, rule: &Rule, store: &MetricStore, _load_level: LoadLevel) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.display_name);

        let mut values = NamedValues::with_capacity(self.metrics.len());
        for source in &self.metrics {
            let Some(value) = store
                .get_non_empty(&source.source)
                .and_then(|m| m.single_value())
            else {
                // Status stays GREEN; the message carries the problem.
                result.message = format!("Metric {} not found", source.source);
                return result;
            };
            result.details.push(format!("{}: {value:.3}", source.name));
            values.push((source.name.clone(), value));
        }

        match self.checks.iter().find(|check| check_matches(check, &values)) {
            Some(check) => {
                if let Ok(status) = check.status.parse::<Status>() {
                    result.status = status;
                }
                result.message = interpolate(&check.message, &values);
            }
            None => result.message = interpolate(&rule.messages.green, &values),
        }
        result
    }
}
