use crate::error::{Result, RuleError};
use crate::model::{
    CorrelationCondition, LoadDetectionRule, Rule, RuleDefinition, RuleKind, RuleType, Thresholds,
};
use regex::Regex;
use std::sync::LazyLock;

/// Accepted forms: `4.7`, `4.7.1`, `4.7+`, `>=4.7`, `4.7-4.9`.
static VERSION_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:>=)?\d+\.\d+(?:\.\d+)?(?:\+|-\d+\.\d+(?:\.\d+)?)?$")
        .expect("version spec regex is valid")
});

/// Checks a parsed rule file and converts it into a typed [`Rule`].
pub fn validate_rule(def: RuleDefinition) -> Result<Rule> {
    if def.rule_type.is_empty() {
        return Err(RuleError::invalid("rule_type is required"));
    }
    let rule_type: RuleType = def.rule_type.parse().map_err(RuleError::Validation)?;
    if rule_type == RuleType::LoadDetection {
        return Err(RuleError::invalid(
            "load_detection rules belong in the load level rules directory",
        ));
    }

    for spec in &def.acs_versions {
        validate_version_spec(spec)
            .map_err(|e| RuleError::Validation(format!("invalid ACS version {spec}: {e}")))?;
    }
    if !def.min_acs_version.is_empty() {
        validate_version_spec(&def.min_acs_version)
            .map_err(|e| RuleError::Validation(format!("invalid min_acs_version: {e}")))?;
    }
    if !def.max_acs_version.is_empty() {
        validate_version_spec(&def.max_acs_version)
            .map_err(|e| RuleError::Validation(format!("invalid max_acs_version: {e}")))?;
    }

    if let Some(overrides) = &def.load_level_thresholds {
        for (level, thresholds) in overrides.bands() {
            if thresholds.low > 0.0 && thresholds.high > 0.0 && thresholds.low >= thresholds.high
            {
                return Err(RuleError::Validation(format!(
                    "invalid load_level_thresholds: {level} load level: low threshold must be less than high threshold"
                )));
            }
        }
    }

    if let Some(correlation) = &def.correlation {
        validate_conditions("suppress_if", &correlation.suppress_if)?;
        validate_conditions("elevate_if", &correlation.elevate_if)?;
    }

    let kind = build_kind(rule_type, &def)?;

    Ok(Rule {
        metric_name: def.metric_name,
        display_name: def.display_name,
        description: def.description,
        reviewed: def.reviewed,
        last_review_by: def.last_review_by,
        last_review_on: def.last_review_on,
        kind,
        thresholds: def.thresholds,
        messages: def.messages,
        remediation: def.remediation,
        load_level_thresholds: def.load_level_thresholds,
        correlation: def.correlation,
        acs_versions: def.acs_versions,
        min_acs_version: def.min_acs_version,
        max_acs_version: def.max_acs_version,
    })
}

fn build_kind(rule_type: RuleType, def: &RuleDefinition) -> Result<RuleKind> {
    let t = &def.thresholds;
    match rule_type {
        RuleType::GaugeThreshold => {
            require_metric_name(def, "gauge")?;
            if !(t.low == 0.0 && t.high == 0.0) {
                require_ordered(t)?;
            }
            Ok(RuleKind::Gauge(def.gauge_config.clone().unwrap_or_default()))
        }
        RuleType::Percentage => {
            let config = def
                .percentage_config
                .clone()
                .ok_or_else(|| RuleError::invalid("percentage_config is required"))?;
            if config.numerator.is_empty() || config.denominator.is_empty() {
                return Err(RuleError::invalid("numerator and denominator are required"));
            }
            require_ordered(t)?;
            Ok(RuleKind::Percentage(config))
        }
        RuleType::QueueOperations => {
            require_metric_name(def, "queue")?;
            let config = def
                .queue_config
                .clone()
                .ok_or_else(|| RuleError::invalid("queue_config is required"))?;
            if config.operation_label.is_empty() {
                return Err(RuleError::invalid("operation_label is required"));
            }
            Ok(RuleKind::Queue(config))
        }
        RuleType::Histogram => {
            require_metric_name(def, "histogram")?;
            if t.p95_good >= t.p95_warn {
                return Err(RuleError::invalid("p95_good must be less than p95_warn"));
            }
            Ok(RuleKind::Histogram(
                def.histogram_config.clone().unwrap_or_default(),
            ))
        }
        RuleType::CacheHitRate => {
            let config = def
                .cache_config
                .clone()
                .ok_or_else(|| RuleError::invalid("cache_config is required"))?;
            if config.hits_metric.is_empty() || config.misses_metric.is_empty() {
                return Err(RuleError::invalid(
                    "hits_metric and misses_metric are required",
                ));
            }
            Ok(RuleKind::CacheHitRate(config))
        }
        RuleType::Composite => {
            let config = def
                .composite_config
                .clone()
                .ok_or_else(|| RuleError::invalid("composite_config is required"))?;
            if config.metrics.is_empty() {
                return Err(RuleError::invalid("at least one metric is required"));
            }
            Ok(RuleKind::Composite(config))
        }
        RuleType::LoadDetection => Err(RuleError::invalid(
            "load_detection rules cannot be evaluated",
        )),
    }
}

fn require_metric_name(def: &RuleDefinition, kind: &str) -> Result<()> {
    if def.metric_name.is_empty() {
        return Err(RuleError::Validation(format!(
            "metric_name is required for {kind} rules"
        )));
    }
    Ok(())
}

fn require_ordered(t: &Thresholds) -> Result<()> {
    if t.low >= t.high {
        return Err(RuleError::invalid(
            "low threshold must be less than high threshold",
        ));
    }
    Ok(())
}

fn validate_conditions(field: &str, conditions: &[CorrelationCondition]) -> Result<()> {
    for (i, cond) in conditions.iter().enumerate() {
        if cond.metric_name.is_empty() {
            return Err(RuleError::Validation(format!(
                "invalid correlation config: {field}[{i}]: metric_name is required"
            )));
        }
    }
    Ok(())
}

pub fn validate_version_spec(spec: &str) -> std::result::Result<(), String> {
    if VERSION_SPEC_RE.is_match(spec) {
        Ok(())
    } else {
        Err(format!(
            "invalid version format: {spec} (expected format: 4.7, 4.7+, >=4.7, or 4.7-4.9)"
        ))
    }
}

pub fn validate_load_detection_rule(rule: &LoadDetectionRule) -> Result<()> {
    if !rule.rule_type.is_empty() && rule.rule_type != RuleType::LoadDetection.to_string() {
        return Err(RuleError::Validation(format!(
            "expected rule_type load_detection, found {}",
            rule.rule_type
        )));
    }
    for band in &rule.thresholds {
        if band.min_value != 0.0 && band.max_value != 0.0 && band.min_value >= band.max_value {
            return Err(RuleError::Validation(format!(
                "{} band: min_value must be less than max_value",
                band.level
            )));
        }
    }
    Ok(())
}

/// Placeholders each rule kind binds when rendering messages.
fn known_placeholders(rule_type: RuleType) -> &'static [&'static str] {
    match rule_type {
        RuleType::GaugeThreshold => &["value", "value_human"],
        RuleType::Percentage => &["value", "numerator", "denominator"],
        RuleType::QueueOperations => &["value", "add", "remove", "diff"],
        RuleType::Histogram => &["value", "p95", "p99"],
        RuleType::CacheHitRate => &["value", "hits", "misses"],
        RuleType::Composite | RuleType::LoadDetection => &[],
    }
}

fn find_placeholders(message: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut start = None;
    for (i, c) in message.char_indices() {
        match c {
            '{' => start = Some(i),
            '}' => {
                if let Some(s) = start.take() {
                    found.push(&message[s + 1..i]);
                }
            }
            _ => {}
        }
    }
    found
}

/// Reports the first message placeholder the rule kind does not bind.
///
/// Unknown placeholders render literally, so this is advisory. Composite
/// messages reference their own metric names and are not checked.
pub fn validate_message_templates(rule: &Rule) -> Result<()> {
    let rule_type = rule.rule_type();
    if rule_type == RuleType::Composite {
        return Ok(());
    }
    let known = known_placeholders(rule_type);
    let messages = [
        &rule.messages.green,
        &rule.messages.yellow,
        &rule.messages.red,
        &rule.messages.zero_activity,
    ];
    for message in messages {
        for placeholder in find_placeholders(message) {
            let name = placeholder.split(':').next().unwrap_or_default();
            if name != "status" && !known.contains(&name) {
                return Err(RuleError::Validation(format!(
                    "invalid placeholder {{{placeholder}}} in message template"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Result<Rule> {
        validate_rule(toml::from_str(toml_text)?)
    }

    #[test]
    fn gauge_existence_sentinel_is_valid() {
        let rule = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "rox_sensor_pods"
[thresholds]
low = 0
high = 0
"#,
        )
        .unwrap();
        assert_eq!(rule.rule_type(), RuleType::GaugeThreshold);
    }

    #[test]
    fn gauge_requires_ordered_thresholds() {
        let err = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "m"
[thresholds]
low = 10
high = 5
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("low threshold must be less"));
    }

    #[test]
    fn missing_and_unknown_rule_type() {
        let err = parse("metric_name = \"m\"").unwrap_err();
        assert!(err.to_string().contains("rule_type is required"));
        let err = parse("rule_type = \"counter\"").unwrap_err();
        assert!(err.to_string().contains("invalid rule_type: counter"));
        let err = parse("rule_type = \"load_detection\"").unwrap_err();
        assert!(err.to_string().contains("load level rules directory"));
    }

    #[test]
    fn type_specific_requirements() {
        let err = parse(
            r#"
rule_type = "percentage"
[thresholds]
low = 1
high = 2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("percentage_config is required"));

        let err = parse(
            r#"
rule_type = "queue_operations"
metric_name = "q"
[queue_config]
add_value = "add"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("operation_label is required"));

        let err = parse(
            r#"
rule_type = "histogram"
metric_name = "h"
[thresholds]
p95_good = 2.0
p95_warn = 1.0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("p95_good must be less than p95_warn"));

        let err = parse(
            r#"
rule_type = "cache_hit_rate"
[cache_config]
hits_metric = "hits"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("hits_metric and misses_metric"));

        let err = parse(
            r#"
rule_type = "composite"
[composite_config]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least one metric"));
    }

    #[test]
    fn version_specs() {
        for ok in ["4.7", "4.7.1", "4.7+", ">=4.7", "4.7-4.9", "4.7.0-4.9.3"] {
            assert!(validate_version_spec(ok).is_ok(), "{ok}");
        }
        for bad in ["4", "v4.7", "4.7-", "latest", ""] {
            assert!(validate_version_spec(bad).is_err(), "{bad}");
        }

        let err = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "m"
acs_versions = ["4.7+", "next"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid ACS version next"));
    }

    #[test]
    fn correlation_operator_and_metric_checked() {
        let err = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "m"
[[correlation.suppress_if]]
metric_name = "other"
operator = "ne"
value = 1
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid operator: ne"));

        let err = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "m"
[[correlation.elevate_if]]
operator = "gt"
value = 1
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("elevate_if[0]: metric_name is required"));
    }

    #[test]
    fn load_level_bands_must_be_ordered() {
        let err = parse(
            r#"
rule_type = "gauge_threshold"
metric_name = "m"
[thresholds]
low = 1
high = 2
[load_level_thresholds.high]
low = 50
high = 20
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("high load level"));

        // A histogram-only override leaves low/high unset.
        parse(
            r#"
rule_type = "histogram"
metric_name = "h"
[thresholds]
p95_good = 0.1
p95_warn = 0.5
[load_level_thresholds.low]
p95_good = 0.05
"#,
        )
        .unwrap();
    }

    #[test]
    fn message_placeholders() {
        let mut rule = parse(
            r#"
rule_type = "queue_operations"
metric_name = "q"
[queue_config]
operation_label = "op"
[messages]
red = "Queue grew by {diff} ({add} added, {remove:.0f} removed)"
"#,
        )
        .unwrap();
        validate_message_templates(&rule).unwrap();

        rule.messages.yellow = "p95 is {p95}".into();
        let err = validate_message_templates(&rule).unwrap_err();
        assert!(err.to_string().contains("{p95}"));
    }

    #[test]
    fn load_detection_bands() {
        let rule: LoadDetectionRule = toml::from_str(
            r#"
rule_type = "load_detection"
[[metrics]]
source = "containers"
weight = 1.0
[[thresholds]]
level = "high"
min_value = 500
max_value = 100
"#,
        )
        .unwrap();
        assert!(validate_load_detection_rule(&rule).is_err());
    }
}
