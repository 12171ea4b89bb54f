use metriage_common::types::{LoadLevel, Status};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    GaugeThreshold,
    Percentage,
    QueueOperations,
    Histogram,
    CacheHitRate,
    Composite,
    LoadDetection,
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gauge_threshold" => Ok(Self::GaugeThreshold),
            "percentage" => Ok(Self::Percentage),
            "queue_operations" => Ok(Self::QueueOperations),
            "histogram" => Ok(Self::Histogram),
            "cache_hit_rate" => Ok(Self::CacheHitRate),
            "composite" => Ok(Self::Composite),
            "load_detection" => Ok(Self::LoadDetection),
            _ => Err(format!("invalid rule_type: {s}")),
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GaugeThreshold => write!(f, "gauge_threshold"),
            Self::Percentage => write!(f, "percentage"),
            Self::QueueOperations => write!(f, "queue_operations"),
            Self::Histogram => write!(f, "histogram"),
            Self::CacheHitRate => write!(f, "cache_hit_rate"),
            Self::Composite => write!(f, "composite"),
            Self::LoadDetection => write!(f, "load_detection"),
        }
    }
}

/// Comparison used by correlation conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    Equal,
    GreaterEqual,
    LessEqual,
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(Self::GreaterThan),
            "lt" => Ok(Self::LessThan),
            "eq" => Ok(Self::Equal),
            "gte" => Ok(Self::GreaterEqual),
            "lte" => Ok(Self::LessEqual),
            _ => Err(format!(
                "invalid operator: {s} (must be one of: gt, lt, eq, gte, lte)"
            )),
        }
    }
}

impl TryFrom<String> for CompareOp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, "gt"),
            Self::LessThan => write!(f, "lt"),
            Self::Equal => write!(f, "eq"),
            Self::GreaterEqual => write!(f, "gte"),
            Self::LessEqual => write!(f, "lte"),
        }
    }
}

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::Equal => value == threshold,
            Self::GreaterEqual => value >= threshold,
            Self::LessEqual => value <= threshold,
        }
    }
}

/// Numeric boundaries for band classification.
///
/// `low == high == 0` on a lower-is-worse gauge is the existence check:
/// any positive value is healthy, zero is not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
    pub higher_is_worse: bool,
    pub p95_good: f64,
    pub p95_warn: f64,
    pub min_ratio: f64,
}

/// Per load level overrides of [`Thresholds`]. A missing level keeps the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadLevelThresholds {
    pub low: Option<Thresholds>,
    pub medium: Option<Thresholds>,
    pub high: Option<Thresholds>,
}

impl LoadLevelThresholds {
    pub fn for_level(&self, level: LoadLevel) -> Option<&Thresholds> {
        match level {
            LoadLevel::Low => self.low.as_ref(),
            LoadLevel::Medium => self.medium.as_ref(),
            LoadLevel::High => self.high.as_ref(),
        }
    }

    pub(crate) fn bands(&self) -> impl Iterator<Item = (LoadLevel, &Thresholds)> {
        [
            (LoadLevel::Low, self.low.as_ref()),
            (LoadLevel::Medium, self.medium.as_ref()),
            (LoadLevel::High, self.high.as_ref()),
        ]
        .into_iter()
        .filter_map(|(level, t)| t.map(|t| (level, t)))
    }
}

/// Message templates per outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub green: String,
    pub yellow: String,
    pub red: String,
    pub zero_activity: String,
}

impl Messages {
    pub fn for_status(&self, status: Status) -> &str {
        match status {
            Status::Green => &self.green,
            Status::Yellow => &self.yellow,
            Status::Red => &self.red,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Remediation {
    pub red: String,
    pub yellow: String,
    pub green: String,
}

impl Remediation {
    pub fn for_status(&self, status: Status) -> &str {
        match status {
            Status::Green => &self.green,
            Status::Yellow => &self.yellow,
            Status::Red => &self.red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorrelationCondition {
    #[serde(default)]
    pub metric_name: String,
    pub operator: CompareOp,
    #[serde(default)]
    pub value: f64,
    /// Forced status when the condition holds; otherwise the status moves one step.
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub suppress_if: Vec<CorrelationCondition>,
    pub elevate_if: Vec<CorrelationCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GaugeConfig {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PercentageConfig {
    pub numerator: String,
    pub denominator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub operation_label: String,
    pub add_value: String,
    pub remove_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub hits_metric: String,
    pub misses_metric: String,
}

/// A named input of a composite rule.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompositeMetric {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    NotZero,
    Ratio,
    /// Never matches.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompositeCheck {
    pub check_type: CheckType,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub numerator: String,
    #[serde(default)]
    pub denominator: String,
    #[serde(default)]
    pub min_ratio: f64,
    /// Free text; an unparseable status leaves the current one unchanged.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub metrics: Vec<CompositeMetric>,
    pub checks: Vec<CompositeCheck>,
}

/// Kind-specific configuration of an evaluable rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Gauge(GaugeConfig),
    Percentage(PercentageConfig),
    Queue(QueueConfig),
    Histogram(HistogramConfig),
    CacheHitRate(CacheConfig),
    Composite(CompositeConfig),
}

impl RuleKind {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleKind::Gauge(_) => RuleType::GaugeThreshold,
            RuleKind::Percentage(_) => RuleType::Percentage,
            RuleKind::Queue(_) => RuleType::QueueOperations,
            RuleKind::Histogram(_) => RuleType::Histogram,
            RuleKind::CacheHitRate(_) => RuleType::CacheHitRate,
            RuleKind::Composite(_) => RuleType::Composite,
        }
    }
}

/// A validated, immutable evaluation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub metric_name: String,
    pub display_name: String,
    pub description: String,
    pub reviewed: String,
    pub last_review_by: String,
    pub last_review_on: String,
    pub kind: RuleKind,
    pub thresholds: Thresholds,
    pub messages: Messages,
    pub remediation: Option<Remediation>,
    pub load_level_thresholds: Option<LoadLevelThresholds>,
    pub correlation: Option<CorrelationConfig>,
    pub acs_versions: Vec<String>,
    pub min_acs_version: String,
    pub max_acs_version: String,
}

impl Rule {
    /// A rule of the given kind with empty metadata and zeroed thresholds.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            metric_name: String::new(),
            display_name: String::new(),
            description: String::new(),
            reviewed: String::new(),
            last_review_by: String::new(),
            last_review_on: String::new(),
            kind,
            thresholds: Thresholds::default(),
            messages: Messages::default(),
            remediation: None,
            load_level_thresholds: None,
            correlation: None,
            acs_versions: Vec::new(),
            min_acs_version: String::new(),
            max_acs_version: String::new(),
        }
    }

    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }

    /// Display name, falling back to the metric name.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.metric_name
        } else {
            &self.display_name
        }
    }

    pub fn has_version_constraints(&self) -> bool {
        !self.acs_versions.is_empty()
            || !self.min_acs_version.is_empty()
            || !self.max_acs_version.is_empty()
    }
}

/// On-disk shape of a rule file before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleDefinition {
    pub rule_type: String,
    pub metric_name: String,
    pub display_name: String,
    pub description: String,
    pub reviewed: String,
    pub last_review_by: String,
    pub last_review_on: String,
    pub gauge_config: Option<GaugeConfig>,
    pub percentage_config: Option<PercentageConfig>,
    pub queue_config: Option<QueueConfig>,
    pub histogram_config: Option<HistogramConfig>,
    pub cache_config: Option<CacheConfig>,
    pub composite_config: Option<CompositeConfig>,
    pub thresholds: Thresholds,
    pub messages: Messages,
    pub remediation: Option<Remediation>,
    pub load_level_thresholds: Option<LoadLevelThresholds>,
    pub correlation: Option<CorrelationConfig>,
    pub acs_versions: Vec<String>,
    pub min_acs_version: String,
    pub max_acs_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadDetectionMetric {
    pub name: String,
    pub source: String,
    pub weight: f64,
}

impl LoadDetectionMetric {
    /// Metric to look up: `source`, or `name` when no source is given.
    pub fn metric_name(&self) -> &str {
        if self.source.is_empty() {
            &self.name
        } else {
            &self.source
        }
    }
}

/// A `[min, max)` band. A non-positive bound on either side means unbounded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoadDetectionThreshold {
    pub level: LoadLevel,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default)]
    pub max_value: f64,
}

impl LoadDetectionThreshold {
    pub fn contains(&self, value: f64) -> bool {
        (self.min_value <= 0.0 || value >= self.min_value)
            && (self.max_value <= 0.0 || value < self.max_value)
    }
}

/// Weighted metric mix that classifies the overall load of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadDetectionRule {
    pub rule_type: String,
    pub display_name: String,
    pub metrics: Vec<LoadDetectionMetric>,
    pub thresholds: Vec<LoadDetectionThreshold>,
}
