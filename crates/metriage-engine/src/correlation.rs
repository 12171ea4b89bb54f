use metriage_common::types::Status;
use metriage_metrics::MetricStore;
use metriage_rules::model::{CorrelationCondition, CorrelationConfig};

/// A single sample is used as is; several samples are summed.
fn condition_holds(cond: &CorrelationCondition, store: &MetricStore) -> bool {
    let Some(metric) = store.get_non_empty(&cond.metric_name) else {
        return false;
    };
    let value = match metric.samples.as_slice() {
        [only] => only.value,
        _ => metric.sum_values(),
    };
    cond.operator.check(value, cond.value)
}

/// Adjusts `status` by the suppress conditions, then the elevate conditions,
/// each in list order. A matching condition forces its own status when it has
/// one, otherwise moves the status one step.
pub fn correlate(config: &CorrelationConfig, store: &MetricStore, status: Status) -> Status {
    let mut status = status;
    for cond in &config.suppress_if {
        if condition_holds(cond, store) {
            let next = cond.status.unwrap_or_else(|| status.downgrade());
            tracing::debug!(metric = %cond.metric_name, from = %status, to = %next, "Suppressed status");
            status = next;
        }
    }
    for cond in &config.elevate_if {
        if condition_holds(cond, store) {
            let next = cond.status.unwrap_or_else(|| status.elevate());
            tracing::debug!(metric = %cond.metric_name, from = %status, to = %next, "Elevated status");
            status = next;
        }
    }
    status
}
