use super::{classify_higher_is_worse, conclude};
use crate::template::Binding;
use crate::thresholds::select_thresholds;
use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel};
use metriage_metrics::{HistogramBucket, MetricStore};
use metriage_rules::model::HistogramConfig;
use metriage_rules::Rule;

/// Smallest bucket bound whose cumulative count reaches `quantile * total`.
fn bucket_quantile(buckets: &[HistogramBucket], quantile: f64, total: f64) -> Option<f64> {
    let target = total * quantile;
    buckets.iter().find(|b| b.count >= target).map(|b| b.le)
}

impl Evaluate for HistogramConfig {
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::new(&rule.metric_name);

        let Some(bucket_metric) = store.get_non_empty(&format!("{}_bucket", rule.metric_name))
        else {
            result.message = format!("Histogram buckets for {} not found", rule.metric_name);
            return result;
        };

        let mut buckets = bucket_metric.histogram_buckets();
        if buckets.is_empty() {
            result.message = "No histogram buckets found".to_string();
            return result;
        }
        buckets.sort_by(|a, b| a.le.total_cmp(&b.le));

        // The highest finite bucket stands in for the total; +Inf belongs to the overflow check.
        let total = buckets.last().map_or(0.0, |b| b.count);
        if total == 0.0 {
            result.message = "No histogram data yet".to_string();
            return result;
        }

        let p95 = bucket_quantile(&buckets, 0.95, total).unwrap_or(0.0);
        let p99 = bucket_quantile(&buckets, 0.99, total).unwrap_or(0.0);
        result.value = p95;
        result.details = vec![
            format!("p95: {p95:.3}"),
            format!("p99: {p99:.3}"),
            format!("count: {total:.0}"),
        ];

        let thresholds = select_thresholds(rule, load_level);
        let status = classify_higher_is_worse(p95, thresholds.p95_good, thresholds.p95_warn);
        tracing::debug!(metric = %rule.metric_name, p95, p99, total, %status, "Evaluated histogram");
        conclude(
            &mut result,
            rule,
            status,
            vec![
                ("value", Binding::Number(p95)),
                ("p95", Binding::Number(p95)),
                ("p99", Binding::Number(p99)),
            ],
        );
        result
    }
}
