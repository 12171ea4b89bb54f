use crate::error::{EngineError, Result};
use metriage_common::types::LoadLevel;
use metriage_metrics::MetricStore;
use metriage_rules::LoadDetectionRule;

/// Classifies snapshot load from a weighted average of configured metrics.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    rules: Vec<LoadDetectionRule>,
}

impl Detector {
    pub fn new(rules: Vec<LoadDetectionRule>) -> Self {
        Self { rules }
    }

    /// Weighted average over the metrics present in `store`, using the first
    /// configured rule. `None` when nothing contributes.
    pub fn score(&self, store: &MetricStore) -> Option<f64> {
        let rule = self.rules.first()?;
        let (weighted_sum, total_weight) = rule
            .metrics
            .iter()
            .filter_map(|def| {
                store
                    .get(def.metric_name())
                    .map(|metric| (metric.sum_values() * def.weight, def.weight))
            })
            .fold((0.0, 0.0), |(sum, weight), (s, w)| (sum + s, weight + w));

        if total_weight == 0.0 {
            return None;
        }
        Some(weighted_sum / total_weight)
    }

    /// First band containing the score; MEDIUM when there are no rules,
    /// no contributing metrics or no matching band.
    pub fn detect(&self, store: &MetricStore) -> LoadLevel {
        let Some(score) = self.score(store) else {
            return LoadLevel::Medium;
        };
        let level = self
            .rules
            .first()
            .and_then(|rule| rule.thresholds.iter().find(|band| band.contains(score)))
            .map_or(LoadLevel::Medium, |band| band.level);
        tracing::debug!(score, %level, "Detected load level");
        level
    }
}

/// A non-empty override must name a load level and always wins over detection.
///
/// # Examples
///
/// ```
/// use metriage_common::types::LoadLevel;
/// use metriage_engine::load_level::{detect_with_override, Detector};
/// use metriage_metrics::MetricStore;
///
/// let store = MetricStore::new();
/// let detector = Detector::default();
/// assert_eq!(detect_with_override(&store, &detector, Some("high")).unwrap(), LoadLevel::High);
/// assert_eq!(detect_with_override(&store, &detector, None).unwrap(), LoadLevel::Medium);
/// assert!(detect_with_override(&store, &detector, Some("extreme")).is_err());
/// ```
pub fn detect_with_override(
    store: &MetricStore,
    detector: &Detector,
    override_level: Option<&str>,
) -> Result<LoadLevel> {
    match override_level.filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<LoadLevel>()
            .map_err(|_| EngineError::InvalidLoadLevel(raw.to_string())),
        None => Ok(detector.detect(store)),
    }
}
