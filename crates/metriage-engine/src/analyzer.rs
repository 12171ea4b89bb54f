use crate::correlation::correlate;
use crate::error::{EngineError, Result};
use crate::load_level::{detect_with_override, Detector};
use crate::overflow::evaluate_histogram_overflow;
use crate::Evaluate;
use chrono::Utc;
use metriage_common::types::{AnalysisReport, EvaluationResult, LoadLevel, Summary};
use metriage_metrics::{prometheus, MetricStore};
use metriage_rules::loader::{load_load_detection_rules, load_rules};
use metriage_rules::version::{filter_rules_by_version, Version};
use metriage_rules::{LoadDetectionRule, Rule};
use std::path::{Path, PathBuf};

/// Subdirectory of the rules directory holding load detection rules.
pub const LOAD_LEVEL_SUBDIR: &str = "load-level";

/// Human readable review state of a rule.
pub fn review_status(rule: &Rule) -> String {
    let review = rule.reviewed.as_str();
    let by = rule.last_review_by.as_str();
    let on = rule.last_review_on.as_str();

    match (review.is_empty(), by.is_empty(), on.is_empty()) {
        (false, false, false) => format!("{review} (last review: {by} on {on})"),
        (false, false, true) => format!("{review} (last review: {by})"),
        (false, true, false) => format!("{review} (last review: {on})"),
        (false, true, true) => review.to_string(),
        (true, false, false) => format!("Last review: {by} on {on}"),
        (true, false, true) => format!("Last review: {by}"),
        (true, true, false) => format!("Last review: {on}"),
        (true, true, true) => "review status unavailable".to_string(),
    }
}

/// Evaluates one rule and applies correlation, review metadata and the
/// remediation for its final status.
pub fn evaluate_rule(rule: &Rule, store: &MetricStore, load_level: LoadLevel) -> EvaluationResult {
    let mut result = rule.kind.evaluate(rule, store, load_level);

    if let Some(correlation) = &rule.correlation {
        result.status = correlate(correlation, store, result.status);
    }

    result.review_status = review_status(rule);
    result.remediation = rule
        .remediation
        .as_ref()
        .map(|r| r.for_status(result.status).to_string())
        .unwrap_or_default();
    result.potential_action_user = result.remediation.clone();
    result.timestamp = Utc::now();

    tracing::debug!(rule = %result.rule_name, status = %result.status, value = result.value, "Evaluated rule");
    result
}

/// Filters `rules` by `acs_version`, evaluates the rest in order and appends
/// the histogram overflow check. The cluster name is left empty.
pub fn evaluate_all_rules(
    rules: &[Rule],
    store: &MetricStore,
    load_level: LoadLevel,
    acs_version: &str,
) -> AnalysisReport {
    let mut results: Vec<EvaluationResult> = filter_rules_by_version(rules, acs_version)
        .into_iter()
        .map(|rule| evaluate_rule(rule, store, load_level))
        .collect();
    results.extend(evaluate_histogram_overflow(store));

    let summary = Summary::tally(&results);
    AnalysisReport {
        cluster_name: String::new(),
        acs_version: acs_version.to_string(),
        load_level,
        timestamp: Utc::now(),
        results,
        summary,
    }
}

/// Inputs of a whole analysis run beyond the metrics themselves.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub rules_dir: PathBuf,
    /// Defaults to `<rules_dir>/load-level`
    pub load_level_dir: Option<PathBuf>,
    /// Defaults to a name derived from the metrics file name
    pub cluster_name: Option<String>,
    pub load_level_override: Option<String>,
    pub acs_version_override: Option<String>,
}

impl AnalyzeOptions {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            ..Self::default()
        }
    }

    /// The ACS version override, if set. An override that carries no
    /// `major.minor` version is rejected instead of silently matching every
    /// version-gated rule.
    fn acs_version_override(&self) -> Result<Option<&str>> {
        match self.acs_version_override.as_deref().filter(|v| !v.is_empty()) {
            Some(raw) if Version::parse(raw).is_none() => {
                Err(EngineError::InvalidAcsVersion(raw.to_string()))
            }
            other => Ok(other),
        }
    }

    fn load_level_dir(&self) -> PathBuf {
        self.load_level_dir
            .clone()
            .unwrap_or_else(|| self.rules_dir.join(LOAD_LEVEL_SUBDIR))
    }
}

/// Derives a cluster name from a metrics file name:
/// `prod-eu-sensor-metrics.txt` becomes `prod-eu`.
pub fn extract_cluster_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base.as_str(),
    };
    let stem = stem.strip_suffix("-sensor-metrics").unwrap_or(stem);
    let stem = stem.strip_suffix("-metrics").unwrap_or(stem);
    stem.to_string()
}

fn load_rule_sets(opts: &AnalyzeOptions) -> Result<(Vec<LoadDetectionRule>, Vec<Rule>)> {
    if opts.rules_dir.as_os_str().is_empty() {
        return Err(EngineError::RulesDirRequired);
    }

    let load_level_dir = opts.load_level_dir();
    let detection_rules = match load_load_detection_rules(&load_level_dir) {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!(dir = %load_level_dir.display(), error = %e, "Failed to load load detection rules");
            Vec::new()
        }
    };

    let rules = load_rules(&opts.rules_dir)?;
    Ok((detection_rules, rules))
}

fn analyze_store(
    store: &MetricStore,
    rules: &[Rule],
    detection_rules: Vec<LoadDetectionRule>,
    source_name: &str,
    opts: &AnalyzeOptions,
) -> Result<AnalysisReport> {
    let acs_version = match opts.acs_version_override()? {
        Some(version) => version.to_string(),
        None => match store.detect_acs_version() {
            Some(version) => {
                tracing::info!(version = %version, "Detected ACS version");
                version
            }
            None => {
                tracing::warn!("Could not detect ACS version");
                String::new()
            }
        },
    };

    let detector = Detector::new(detection_rules);
    let load_level = detect_with_override(store, &detector, opts.load_level_override.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Load level detection failed");
            LoadLevel::Medium
        });
    tracing::info!(load_level = %load_level, "Using load level");

    let mut report = evaluate_all_rules(rules, store, load_level, &acs_version);
    report.cluster_name = opts
        .cluster_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| extract_cluster_name(source_name));

    tracing::info!(
        cluster = %report.cluster_name,
        total = report.summary.total_analyzed,
        red = report.summary.red_count,
        yellow = report.summary.yellow_count,
        green = report.summary.green_count,
        "Analysis complete"
    );
    Ok(report)
}

/// Parses `metrics_file` and evaluates the rules configured in `opts`.
pub fn analyze_file(metrics_file: impl AsRef<Path>, opts: &AnalyzeOptions) -> Result<AnalysisReport> {
    let metrics_file = metrics_file.as_ref();
    let (detection_rules, rules) = load_rule_sets(opts)?;
    let store = prometheus::parse_file(metrics_file)?;
    tracing::info!(path = %metrics_file.display(), metrics = store.len(), "Parsed metrics");
    analyze_store(
        &store,
        &rules,
        detection_rules,
        &metrics_file.to_string_lossy(),
        opts,
    )
}

/// Same as [`analyze_file`] for an in-memory dump, e.g. an HTTP upload.
pub fn analyze_content(file_name: &str, content: &str, opts: &AnalyzeOptions) -> Result<AnalysisReport> {
    let (detection_rules, rules) = load_rule_sets(opts)?;
    let store = prometheus::parse_str(content);
    tracing::info!(file = file_name, metrics = store.len(), "Parsed uploaded metrics");
    analyze_store(&store, &rules, detection_rules, file_name, opts)
}
