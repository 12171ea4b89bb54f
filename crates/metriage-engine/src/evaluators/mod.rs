pub mod cache;
pub mod composite;
pub mod gauge;
pub mod histogram;
pub mod percentage;
pub mod queue;

use crate::template::{render, Binding};
use crate::Evaluate;
use metriage_common::types::{EvaluationResult, LoadLevel, Status};
use metriage_metrics::MetricStore;
use metriage_rules::{Rule, RuleKind, Thresholds};

impl Evaluate for RuleKind {
    fn evaluate(
        &self,
        rule: &Rule,
        store: &MetricStore,
        load_level: LoadLevel,
    ) -> EvaluationResult {
        match self {
            RuleKind::Gauge(config) => config.evaluate(rule, store, load_level),
            RuleKind::Percentage(config) => config.evaluate(rule, store, load_level),
            RuleKind::Queue(config) => config.evaluate(rule, store, load_level),
            RuleKind::Histogram(config) => config.evaluate(rule, store, load_level),
            RuleKind::CacheHitRate(config) => config.evaluate(rule, store, load_level),
            RuleKind::Composite(config) => config.evaluate(rule, store, load_level),
        }
    }
}

/// `v < low` GREEN, `low <= v < high` YELLOW, otherwise RED.
pub(crate) fn classify_higher_is_worse(value: f64, low: f64, high: f64) -> Status {
    if value < low {
        Status::Green
    } else if value < high {
        Status::Yellow
    } else {
        Status::Red
    }
}

/// `v >= high` GREEN, `low <= v < high` YELLOW, otherwise RED.
pub(crate) fn classify_higher_is_better(value: f64, low: f64, high: f64) -> Status {
    if value >= high {
        Status::Green
    } else if value >= low {
        Status::Yellow
    } else {
        Status::Red
    }
}

pub(crate) fn classify_bands(value: f64, thresholds: &Thresholds) -> Status {
    if thresholds.higher_is_worse {
        classify_higher_is_worse(value, thresholds.low, thresholds.high)
    } else {
        classify_higher_is_better(value, thresholds.low, thresholds.high)
    }
}

/// Sets `status` and renders the matching message with `bindings` plus `{status}`.
pub(crate) fn conclude(
    result: &mut EvaluationResult,
    rule: &Rule,
    status: Status,
    bindings: Vec<(&str, Binding)>,
) {
    let mut bindings = bindings;
    bindings.push(("status", Binding::Text(status.to_string())));
    result.status = status;
    result.message = render(rule.messages.for_status(status), &bindings);
}
