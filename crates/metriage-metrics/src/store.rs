use std::collections::HashMap;

/// Label name carrying a histogram bucket's upper bound.
pub const LE_LABEL: &str = "le";

/// Upper bound of the overflow bucket.
pub const INF_BOUND: &str = "+Inf";

const BUCKET_SUFFIX: &str = "_bucket";

/// Metrics that expose the product version as a label, in lookup order.
const VERSION_METRICS: &[&str] = &[
    "rox_sensor_version_info",
    "rox_central_version_info",
    "rox_version",
];

const VERSION_LABELS: &[&str] = &["version", "rox_version"];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub labels: HashMap<String, String>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(value: f64) -> Self {
        Self {
            labels: HashMap::new(),
            value,
        }
    }

    pub fn with_labels(labels: &[(&str, &str)], value: f64) -> Self {
        Self {
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        }
    }
}

/// A cumulative histogram bucket: `count` observations were `<= le`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBucket {
    pub le: f64,
    pub count: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Metric {
    pub name: String,
    pub help: Option<String>,
    /// Declared type (`gauge`, `counter`, `histogram`, ...)
    pub metric_type: Option<String>,
    pub samples: Vec<MetricSample>,
}

impl Metric {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_sample(mut self, sample: MetricSample) -> Self {
        self.samples.push(sample);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Value of the first sample, for gauges and counters.
    pub fn single_value(&self) -> Option<f64> {
        self.samples.first().map(|s| s.value)
    }

    pub fn sum_values(&self) -> f64 {
        self.samples.iter().map(|s| s.value).sum()
    }

    /// Sample values keyed by the value of `label_key`.
    ///
    /// Samples without the label are ignored; when several samples share a
    /// label value the last one wins.
    pub fn values_by_label(&self, label_key: &str) -> HashMap<String, f64> {
        let mut values = HashMap::new();
        for sample in &self.samples {
            if let Some(label_value) = sample.labels.get(label_key) {
                values.insert(label_value.clone(), sample.value);
            }
        }
        values
    }

    /// Finite cumulative buckets in sample order. `+Inf` and unparseable
    /// bounds are excluded.
    pub fn histogram_buckets(&self) -> Vec<HistogramBucket> {
        self.samples
            .iter()
            .filter_map(|sample| {
                let le = sample.labels.get(LE_LABEL)?;
                if le == INF_BOUND {
                    return None;
                }
                let le: f64 = le.parse().ok()?;
                Some(HistogramBucket {
                    le,
                    count: sample.value,
                })
            })
            .collect()
    }
}

/// Parsed metrics snapshot keyed by exact metric name.
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    metrics: HashMap<String, Metric>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric) {
        self.metrics.insert(metric.name.clone(), metric);
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    /// Like [`get`](Self::get) but treats a metric without samples as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&Metric> {
        self.get(name).filter(|m| !m.is_empty())
    }

    pub(crate) fn entry(&mut self, name: &str) -> &mut Metric {
        self.metrics
            .entry(name.to_string())
            .or_insert_with(|| Metric::new(name))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Base names of every histogram whose `_bucket` series is present,
    /// sorted for stable report ordering.
    pub fn histogram_base_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .metrics
            .values()
            .filter(|m| m.samples.iter().any(|s| s.labels.contains_key(LE_LABEL)))
            .filter_map(|m| m.name.strip_suffix(BUCKET_SUFFIX))
            .filter(|base| !base.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Find the product version advertised by well-known info metrics.
    pub fn detect_acs_version(&self) -> Option<String> {
        VERSION_METRICS
            .iter()
            .filter_map(|name| self.get(name))
            .flat_map(|metric| metric.samples.iter())
            .find_map(|sample| {
                VERSION_LABELS
                    .iter()
                    .filter_map(|label| sample.labels.get(*label))
                    .find(|v| !v.is_empty())
                    .cloned()
            })
    }
}

impl FromIterator<Metric> for MetricStore {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        let mut store = MetricStore::new();
        for metric in iter {
            store.insert(metric);
        }
        store
    }
}
