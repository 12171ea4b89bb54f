//! `+Inf` bucket overflow check, run for every histogram in a snapshot.
//!
//! A histogram with many observations above its highest finite bound has an
//! undersized bucket schema. Series that differ in labels other than `le` are
//! checked separately and the worst one is reported.

use metriage_common::format::human_number;
use metriage_common::types::{EvaluationResult, Status};
use metriage_metrics::store::{INF_BOUND, LE_LABEL};
use metriage_metrics::{MetricSample, MetricStore};
use std::collections::BTreeMap;

pub const REVIEW_STATUS: &str = "Automatically generated rule; review by the code author";

const RED_PERCENT: f64 = 50.0;
const YELLOW_PERCENT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SeriesOverflow {
    total: f64,
    in_inf: f64,
    percent: f64,
    highest_finite_le: f64,
}

/// Sorted `k=v` pairs of every label except `le`, joined by `,`.
fn series_key(sample: &MetricSample) -> String {
    let mut pairs: Vec<String> = sample
        .labels
        .iter()
        .filter(|(k, _)| k.as_str() != LE_LABEL)
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    pairs.sort();
    pairs.join(",")
}

fn series_overflow(samples: &[&MetricSample]) -> Option<SeriesOverflow> {
    let mut inf_count = None;
    let mut highest: Option<(f64, f64)> = None;

    for sample in samples {
        let Some(le) = sample.labels.get(LE_LABEL) else {
            continue;
        };
        if le == INF_BOUND {
            inf_count = Some(sample.value);
        } else if let Ok(bound) = le.parse::<f64>() {
            if highest.map_or(true, |(le, _)| bound > le) {
                highest = Some((bound, sample.value));
            }
        }
    }

    let total = inf_count.filter(|c| *c != 0.0)?;
    let (highest_finite_le, highest_count) = highest?;
    let in_inf = total - highest_count;
    if in_inf < 0.0 {
        return None;
    }

    Some(SeriesOverflow {
        total,
        in_inf,
        percent: in_inf / total * 100.0,
        highest_finite_le,
    })
}

pub fn classify(percent: f64) -> Status {
    if percent > RED_PERCENT {
        Status::Red
    } else if percent > YELLOW_PERCENT {
        Status::Yellow
    } else {
        Status::Green
    }
}

/// Checks one histogram. `None` when no series has evaluable data.
pub fn check_histogram(base_name: &str, store: &MetricStore) -> Option<EvaluationResult> {
    let bucket_name = format!("{base_name}_bucket");
    let bucket_metric = store.get_non_empty(&bucket_name)?;

    let mut series: BTreeMap<String, Vec<&MetricSample>> = BTreeMap::new();
    for sample in &bucket_metric.samples {
        series.entry(series_key(sample)).or_default().push(sample);
    }

    let worst = series
        .values()
        .filter_map(|samples| series_overflow(samples))
        .fold(None::<SeriesOverflow>, |worst, candidate| match worst {
            Some(w) if w.percent >= candidate.percent => Some(w),
            _ => Some(candidate),
        })?;

    let mut result = EvaluationResult::new(format!("{base_name} (+Inf overflow check)"));
    result.status = classify(worst.percent);
    result.review_status = REVIEW_STATUS.to_string();

    let description = [base_name, bucket_name.as_str()]
        .into_iter()
        .filter_map(|name| store.get(name)?.help.as_deref())
        .find(|help| !help.is_empty());
    if let Some(help) = description {
        result.details.push(format!("Metric Description: {help}"));
    }

    let total = human_number(worst.total);
    let in_inf = human_number(worst.in_inf);
    let percent = human_number(worst.percent);
    let highest = human_number(worst.highest_finite_le);
    result.details.extend([
        format!("Total Number of Observations: {total} unit"),
        format!("Observations in +Inf bucket: {in_inf} unit"),
        format!("Percentage of observations in +Inf bucket: {percent} %"),
        format!("Highest non-infinity bucket: {highest} unit"),
    ]);
    result.value = worst.percent;

    if worst.percent > YELLOW_PERCENT {
        result.message = format!(
            "{percent}% of observations are in +Inf bucket ({in_inf} out of {total}). \
             This indicates the metric designer likely didn't expect processing durations to be so high. \
             Highest non-infinity bucket: {highest}"
        );
        result.potential_action_user = format!(
            "Further investigation is required to understand why values exceed {highest}. \
             Check if there are other alerts for this specific metric with more precise context."
        );
        result.potential_action_developer = "Review code paths and metric instrumentation \
             to confirm whether observed latencies are expected."
            .to_string();
    } else {
        result.message = format!(
            "{percent}% of observations in +Inf bucket (acceptable). Highest non-infinity bucket: {highest}"
        );
    }

    Some(result)
}

/// Runs [`check_histogram`] for every histogram in the store, in name order.
pub fn evaluate_histogram_overflow(store: &MetricStore) -> Vec<EvaluationResult> {
    let results: Vec<EvaluationResult> = store
        .histogram_base_names()
        .iter()
        .filter_map(|base| check_histogram(base, store))
        .collect();
    tracing::debug!(histograms = results.len(), "Checked histogram overflow");
    results
}
