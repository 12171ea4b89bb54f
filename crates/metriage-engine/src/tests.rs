use crate::analyzer::{analyze_file, evaluate_all_rules, evaluate_rule, AnalyzeOptions};
use crate::Evaluate;
use metriage_common::types::{LoadLevel, Status};
use metriage_metrics::prometheus::parse_str;
use metriage_metrics::{Metric, MetricSample, MetricStore};
use metriage_rules::loader::parse_rule;
use metriage_rules::Rule;

const SNAPSHOT: &str = r#"
# HELP rox_sensor_version_info Sensor build information
rox_sensor_version_info{version="4.8.2"} 1
rox_sensor_pods 12
rox_sensor_deployments 0
rox_sensor_events_dropped_total 3
rox_sensor_events_total 100
rox_sensor_idle_processed_total 0
rox_sensor_idle_total 0
rox_sensor_queue_ops{op="add"} 120
rox_sensor_queue_ops{op="remove"} 100
rox_sensor_cache_hits 90
rox_sensor_cache_misses 10
rox_sensor_nodes 3
rox_sensor_ready_nodes 1
# HELP rox_sensor_processing_seconds Time spent processing events
# TYPE rox_sensor_processing_seconds histogram
rox_sensor_processing_seconds_bucket{le="0.005"} 100
rox_sensor_processing_seconds_bucket{le="0.01"} 150
rox_sensor_processing_seconds_bucket{le="0.025"} 180
rox_sensor_processing_seconds_bucket{le="0.05"} 190
rox_sensor_processing_seconds_bucket{le="+Inf"} 200
rox_sensor_processing_seconds_sum 2.5
rox_sensor_processing_seconds_count 200
rox_sensor_restarts 4
"#;

fn rule(toml_text: &str) -> Rule {
    parse_rule(toml_text).unwrap()
}

fn gauge_rule(low: f64, high: f64, higher_is_worse: bool) -> Rule {
    rule(&format!(
        r#"
rule_type = "gauge_threshold"
metric_name = "g"
[thresholds]
low = {low}
high = {high}
higher_is_worse = {higher_is_worse}
[messages]
green = "ok {{value}}"
yellow = "warn {{value}}"
red = "bad {{value}}"
"#
    ))
}

fn gauge_store(value: f64) -> MetricStore {
    vec![Metric::new("g").with_sample(MetricSample::new(value))]
        .into_iter()
        .collect()
}

fn eval(rule: &Rule, store: &MetricStore) -> (Status, f64, String) {
    let result = rule.kind.evaluate(rule, store, LoadLevel::Medium);
    (result.status, result.value, result.message)
}

#[test]
fn gauge_higher_is_worse_is_monotonic_with_exact_boundaries() {
    let rule = gauge_rule(10.0, 20.0, true);
    let mut previous = Status::Green;
    for step in 0..60 {
        let value = step as f64 * 0.5;
        let (status, _, _) = eval(&rule, &gauge_store(value));
        assert!(status >= previous, "status dropped at {value}");
        previous = status;
    }
    assert_eq!(eval(&rule, &gauge_store(10.0)).0, Status::Yellow);
    assert_eq!(eval(&rule, &gauge_store(20.0)).0, Status::Red);
    assert_eq!(eval(&rule, &gauge_store(19.99)).2, "warn 20");
}

#[test]
fn gauge_existence_check_never_yellow() {
    let rule = gauge_rule(0.0, 0.0, false);
    for value in [0.001, 1.0, 5e9] {
        assert_eq!(eval(&rule, &gauge_store(value)).0, Status::Green);
    }
    let (status, _, message) = eval(&rule, &gauge_store(0.0));
    assert_eq!(status, Status::Red);
    assert_eq!(message, "bad 0");
}

#[test]
fn gauge_lower_is_worse() {
    let rule = gauge_rule(5.0, 10.0, false);
    assert_eq!(eval(&rule, &gauge_store(10.0)).0, Status::Green);
    assert_eq!(eval(&rule, &gauge_store(5.0)).0, Status::Yellow);
    assert_eq!(eval(&rule, &gauge_store(4.9)).0, Status::Red);
}

#[test]
fn gauge_missing_metric_is_informational() {
    let rule = gauge_rule(1.0, 2.0, true);
    let result = rule.kind.evaluate(&rule, &MetricStore::new(), LoadLevel::Medium);
    assert_eq!(result.status, Status::Green);
    assert_eq!(result.message, "Metric g not found");
    assert_eq!(result.rule_name, "g");
}

#[test]
fn gauge_value_human_binding() {
    let mut rule = gauge_rule(1.0, 2.0, false);
    rule.messages.green = "{value_human} objects ({status})".into();
    let (_, _, message) = eval(&rule, &gauge_store(15000.0));
    assert_eq!(message, "15 000 objects (GREEN)");
}

#[test]
fn gauge_uses_load_level_thresholds() {
    let rule = rule(
        r#"
rule_type = "gauge_threshold"
metric_name = "g"
[thresholds]
low = 10
high = 20
higher_is_worse = true
[load_level_thresholds.high]
low = 100
high = 200
higher_is_worse = true
"#,
    );
    let store = gauge_store(50.0);
    assert_eq!(
        rule.kind.evaluate(&rule, &store, LoadLevel::Medium).status,
        Status::Red
    );
    assert_eq!(
        rule.kind.evaluate(&rule, &store, LoadLevel::High).status,
        Status::Green
    );
}

fn percentage_rule() -> Rule {
    rule(
        r#"
rule_type = "percentage"
display_name = "Dropped events"
[percentage_config]
numerator = "rox_sensor_events_dropped_total"
denominator = "rox_sensor_events_total"
[thresholds]
low = 1
high = 5
[messages]
yellow = "{value:.1f}% dropped ({numerator} of {denominator})"
"#,
    )
}

#[test]
fn percentage_classifies_higher_is_worse() {
    let store = parse_str(SNAPSHOT);
    let rule = percentage_rule();
    let result = rule.kind.evaluate(&rule, &store, LoadLevel::Medium);
    assert_eq!(result.rule_name, "Dropped events");
    assert_eq!(result.status, Status::Yellow);
    assert_eq!(result.value, 3.0);
    assert_eq!(result.message, "3.0% dropped (3 of 100)");
}

#[test]
fn percentage_zero_denominator_is_green_regardless_of_numerator() {
    let mut rule = percentage_rule();
    for numerator in [0.0, 1.0, 1e12] {
        let store: MetricStore = vec![
            Metric::new("rox_sensor_events_dropped_total").with_sample(MetricSample::new(numerator)),
            Metric::new("rox_sensor_events_total").with_sample(MetricSample::new(0.0)),
        ]
        .into_iter()
        .collect();
        let (status, _, message) = eval(&rule, &store);
        assert_eq!(status, Status::Green);
        assert_eq!(message, "No activity yet (denominator is zero)");
    }

    rule.messages.zero_activity = "Nothing processed yet".into();
    let store: MetricStore = vec![
        Metric::new("rox_sensor_events_dropped_total").with_sample(MetricSample::new(7.0)),
        Metric::new("rox_sensor_events_total").with_sample(MetricSample::new(0.0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(eval(&rule, &store).2, "Nothing processed yet");
}

#[test]
fn queue_diff_uses_operation_labels() {
    let rule = rule(
        r#"
rule_type = "queue_operations"
metric_name = "rox_sensor_queue_ops"
[queue_config]
operation_label = "op"
add_value = "add"
remove_value = "remove"
[thresholds]
low = 10
high = 50
higher_is_worse = true
[messages]
yellow = "{diff} pending ({add} in, {remove} out)"
"#,
    );
    let store = parse_str(SNAPSHOT);
    let (status, value, message) = eval(&rule, &store);
    assert_eq!(status, Status::Yellow);
    assert_eq!(value, 20.0);
    assert_eq!(message, "20 pending (120 in, 100 out)");

    let unlabelled: MetricStore = vec![Metric::new("rox_sensor_queue_ops").with_sample(MetricSample::new(9.0))]
        .into_iter()
        .collect();
    let (status, value, _) = eval(&rule, &unlabelled);
    assert_eq!(status, Status::Green);
    assert_eq!(value, 0.0);
}

fn histogram_rule() -> Rule {
    rule(
        r#"
rule_type = "histogram"
metric_name = "rox_sensor_processing_seconds"
[thresholds]
p95_good = 0.025
p95_warn = 0.1
[messages]
yellow = "p95 {p95:.3f}s, p99 {p99:.3f}s"
"#,
    )
}

#[test]
fn histogram_p95_is_bucket_boundary() {
    let store = parse_str(SNAPSHOT);
    let rule = histogram_rule();
    let result = rule.kind.evaluate(&rule, &store, LoadLevel::Medium);
    assert_eq!(result.value, 0.05);
    assert_eq!(result.status, Status::Yellow);
    assert_eq!(result.message, "p95 0.050s, p99 0.050s");
    assert_eq!(result.details, vec!["p95: 0.050", "p99: 0.050", "count: 190"]);
}

#[test]
fn histogram_without_data() {
    let rule = histogram_rule();
    let (_, _, message) = eval(&rule, &MetricStore::new());
    assert_eq!(message, "Histogram buckets for rox_sensor_processing_seconds not found");

    let empty = parse_str(
        "rox_sensor_processing_seconds_bucket{le=\"1\"} 0\nrox_sensor_processing_seconds_bucket{le=\"+Inf\"} 0\n",
    );
    let (status, _, message) = eval(&rule, &empty);
    assert_eq!(status, Status::Green);
    assert_eq!(message, "No histogram data yet");
}

#[test]
fn cache_hit_rate_is_higher_is_better_even_when_flag_says_otherwise() {
    let rule = rule(
        r#"
rule_type = "cache_hit_rate"
display_name = "Cache"
[cache_config]
hits_metric = "rox_sensor_cache_hits"
misses_metric = "rox_sensor_cache_misses"
[thresholds]
low = 50
high = 80
higher_is_worse = true
[messages]
green = "{value:.0f}% hits ({hits}/{misses})"
"#,
    );
    let store = parse_str(SNAPSHOT);
    let (status, value, message) = eval(&rule, &store);
    assert_eq!(status, Status::Green);
    assert_eq!(value, 90.0);
    assert_eq!(message, "90% hits (90/10)");

    let idle: MetricStore = vec![
        Metric::new("rox_sensor_cache_hits").with_sample(MetricSample::new(0.0)),
        Metric::new("rox_sensor_cache_misses").with_sample(MetricSample::new(0.0)),
    ]
    .into_iter()
    .collect();
    assert_eq!(eval(&rule, &idle).2, "No cache activity yet (0 hits, 0 misses)");
}

fn composite_rule() -> Rule {
    rule(
        r#"
rule_type = "composite"
display_name = "Node readiness"
[composite_config]
[[composite_config.metrics]]
name = "nodes"
source = "rox_sensor_nodes"
[[composite_config.metrics]]
name = "ready"
source = "rox_sensor_ready_nodes"
[[composite_config.checks]]
check_type = "not_zero"
metrics = ["ready"]
status = "RED"
message = "No ready nodes out of {nodes}"
[[composite_config.checks]]
check_type = "ratio"
numerator = "ready"
denominator = "nodes"
min_ratio = 0.5
status = "yellow"
message = "Only {ready} of {nodes} nodes ready"
[messages]
green = "{ready}/{nodes} nodes ready"
"#,
    )
}

#[test]
fn composite_first_matching_check_wins() {
    let rule = composite_rule();
    let store = parse_str(SNAPSHOT);
    let result = rule.kind.evaluate(&rule, &store, LoadLevel::Medium);
    assert_eq!(result.status, Status::Yellow);
    assert_eq!(result.message, "Only 1 of 3 nodes ready");
    assert_eq!(result.details, vec!["nodes: 3.000", "ready: 1.000"]);

    let healthy = parse_str("rox_sensor_nodes 3\nrox_sensor_ready_nodes 3\n");
    let (status, _, message) = eval(&rule, &healthy);
    assert_eq!(status, Status::Green);
    assert_eq!(message, "3/3 nodes ready");

    let down = parse_str("rox_sensor_nodes 3\nrox_sensor_ready_nodes 0\n");
    assert_eq!(eval(&rule, &down).0, Status::Red);
}

#[test]
fn composite_missing_source_stays_green() {
    let rule = composite_rule();
    let store = parse_str("rox_sensor_nodes 3\n");
    let (status, _, message) = eval(&rule, &store);
    assert_eq!(status, Status::Green);
    assert_eq!(message, "Metric rox_sensor_ready_nodes not found");
}

#[test]
fn correlation_runs_after_evaluation() {
    let rule = rule(
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
[thresholds]
low = 5
high = 10
higher_is_worse = true
[[correlation.suppress_if]]
metric_name = "rox_sensor_restarts"
operator = "gt"
value = 2
[remediation]
red = "Scale down"
yellow = "Keep an eye on pod churn"
"#,
    );
    let store = parse_str(SNAPSHOT);
    let result = evaluate_rule(&rule, &store, LoadLevel::Medium);
    assert_eq!(result.status, Status::Yellow);
    assert_eq!(result.remediation, "Keep an eye on pod churn");
    assert_eq!(result.potential_action_user, result.remediation);
    assert_eq!(result.review_status, "review status unavailable");
}

#[test]
fn elevate_moves_one_step_up() {
    let rule = rule(
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
[thresholds]
low = 10
high = 20
higher_is_worse = true
[[correlation.elevate_if]]
metric_name = "rox_sensor_deployments"
operator = "eq"
value = 0
"#,
    );
    let store = parse_str(SNAPSHOT);
    assert_eq!(evaluate_rule(&rule, &store, LoadLevel::Medium).status, Status::Red);
}

#[test]
fn version_filter_applies_before_evaluation() {
    let old_only = rule(
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
acs_versions = ["4.5-4.7"]
"#,
    );
    let current = rule(
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_deployments"
acs_versions = ["4.7+", "4.8+"]
"#,
    );
    let store = parse_str(SNAPSHOT);
    let rules = vec![old_only, current];

    let report = evaluate_all_rules(&rules, &store, LoadLevel::Medium, "4.8.2");
    let names: Vec<&str> = report.results.iter().map(|r| r.rule_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "rox_sensor_deployments",
            "rox_sensor_processing_seconds (+Inf overflow check)"
        ]
    );

    let unfiltered = evaluate_all_rules(&rules, &store, LoadLevel::Medium, "");
    assert_eq!(unfiltered.results.len(), 3);
}

#[test]
fn repeated_evaluation_is_stable() {
    let store = parse_str(SNAPSHOT);
    let rules = vec![percentage_rule(), histogram_rule(), composite_rule()];
    let first = evaluate_all_rules(&rules, &store, LoadLevel::Low, "4.8.2");
    let second = evaluate_all_rules(&rules, &store, LoadLevel::Low, "4.8.2");
    let pairs = |r: &metriage_common::types::AnalysisReport| -> Vec<(Status, f64)> {
        r.results.iter().map(|x| (x.status, x.value)).collect()
    };
    assert_eq!(pairs(&first), pairs(&second));
}

#[test]
fn end_to_end_summary_counts_every_result() {
    let rules_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        rules_dir.path().join("pods.toml"),
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
reviewed = "yes"
last_review_by = "sre-team"
[thresholds]
low = 0
high = 0
"#,
    )
    .unwrap();
    std::fs::write(
        rules_dir.path().join("histogram.toml"),
        r#"
rule_type = "histogram"
metric_name = "rox_sensor_processing_seconds"
[thresholds]
p95_good = 0.1
p95_warn = 0.5
"#,
    )
    .unwrap();
    let load_dir = rules_dir.path().join("load-level");
    std::fs::create_dir(&load_dir).unwrap();
    std::fs::write(
        load_dir.join("load.toml"),
        r#"
rule_type = "load_detection"
[[metrics]]
source = "rox_sensor_pods"
weight = 1.0
[[thresholds]]
level = "low"
max_value = 100
"#,
    )
    .unwrap();

    let metrics_dir = tempfile::tempdir().unwrap();
    let metrics_file = metrics_dir.path().join("prod-eu-sensor-metrics.txt");
    std::fs::write(&metrics_file, SNAPSHOT).unwrap();

    let report = analyze_file(&metrics_file, &AnalyzeOptions::new(rules_dir.path())).unwrap();
    assert_eq!(report.cluster_name, "prod-eu");
    assert_eq!(report.acs_version, "4.8.2");
    assert_eq!(report.load_level, LoadLevel::Low);
    assert_eq!(report.summary.total_analyzed, report.results.len());
    assert_eq!(report.results.len(), 3);
    assert_eq!(
        report.summary.red_count + report.summary.yellow_count + report.summary.green_count,
        report.summary.total_analyzed
    );
    assert_eq!(report.results[0].rule_name, "rox_sensor_processing_seconds");
    assert_eq!(report.results[1].review_status, "yes (last review: sre-team)");
    assert_eq!(
        report.results[2].rule_name,
        "rox_sensor_processing_seconds (+Inf overflow check)"
    );
}

#[test]
fn invalid_load_level_override_falls_back_to_medium() {
    let rules_dir = tempfile::tempdir().unwrap();
    let opts = AnalyzeOptions {
        load_level_override: Some("extreme".into()),
        acs_version_override: Some("4.9.0".into()),
        cluster_name: Some("named".into()),
        ..AnalyzeOptions::new(rules_dir.path())
    };
    let report = crate::analyzer::analyze_content("upload.txt", SNAPSHOT, &opts).unwrap();
    assert_eq!(report.load_level, LoadLevel::Medium);
    assert_eq!(report.acs_version, "4.9.0");
    assert_eq!(report.cluster_name, "named");
    assert_eq!(report.results.len(), 1, "only the overflow check runs");
}

#[test]
fn missing_rules_dir_aborts_the_run() {
    let opts = AnalyzeOptions::new("/no/such/rules");
    let err = crate::analyzer::analyze_content("x.txt", SNAPSHOT, &opts).unwrap_err();
    assert!(err.to_string().contains("/no/such/rules"));
}

#[test]
fn unparsable_acs_version_override_is_rejected() {
    let rules_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        rules_dir.path().join("gated.toml"),
        r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
min_acs_version = "4.5"
"#,
    )
    .unwrap();

    for raw in ["latest", "v4", "dev-build"] {
        let opts = AnalyzeOptions {
            acs_version_override: Some(raw.into()),
            ..AnalyzeOptions::new(rules_dir.path())
        };
        let err = crate::analyzer::analyze_content("upload.txt", SNAPSHOT, &opts).unwrap_err();
        assert!(
            matches!(&err, crate::error::EngineError::InvalidAcsVersion(v) if v == raw),
            "{raw}: {err}"
        );
    }

    let opts = AnalyzeOptions {
        acs_version_override: Some("4.4.1".into()),
        ..AnalyzeOptions::new(rules_dir.path())
    };
    let report = crate::analyzer::analyze_content("upload.txt", SNAPSHOT, &opts).unwrap();
    assert_eq!(report.acs_version, "4.4.1");
    assert!(report.results.iter().all(|r| r.rule_name != "rox_sensor_pods"));
}
