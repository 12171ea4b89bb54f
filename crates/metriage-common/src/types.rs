use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tri-state health status, ordered from best to worst.
///
/// # Examples
///
/// ```
/// use metriage_common::types::Status;
///
/// let status: Status = "yellow".parse().unwrap();
/// assert_eq!(status, Status::Yellow);
/// assert_eq!(status.to_string(), "YELLOW");
/// assert!(Status::Red > Status::Green);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    #[serde(alias = "green")]
    Green,
    #[serde(alias = "yellow")]
    Yellow,
    #[serde(alias = "red")]
    Red,
}

impl Status {
    /// One step towards GREEN. GREEN stays GREEN.
    pub fn downgrade(self) -> Self {
        match self {
            Status::Red => Status::Yellow,
            Status::Yellow | Status::Green => Status::Green,
        }
    }

    /// One step towards RED. RED stays RED.
    pub fn elevate(self) -> Self {
        match self {
            Status::Green => Status::Yellow,
            Status::Yellow | Status::Red => Status::Red,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Green => write!(f, "GREEN"),
            Status::Yellow => write!(f, "YELLOW"),
            Status::Red => write!(f, "RED"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREEN" | "green" => Ok(Status::Green),
            "YELLOW" | "yellow" => Ok(Status::Yellow),
            "RED" | "red" => Ok(Status::Red),
            _ => Err(format!("unknown status: {s}")),
        }
    }
}

/// Coarse classification of how busy the monitored system was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadLevel::Low => write!(f, "low"),
            LoadLevel::Medium => write!(f, "medium"),
            LoadLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for LoadLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(LoadLevel::Low),
            "medium" => Ok(LoadLevel::Medium),
            "high" => Ok(LoadLevel::High),
            _ => Err(format!("invalid load level: {s}")),
        }
    }
}

/// Outcome of evaluating one rule against one metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rule_name: String,
    pub status: Status,
    pub message: String,
    pub value: f64,
    /// Ordered, human readable detail lines (e.g. `p95: 0.050`)
    pub details: Vec<String>,
    pub review_status: String,
    /// Remediation text configured for the final status
    pub remediation: String,
    pub potential_action_user: String,
    pub potential_action_developer: String,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
    /// A GREEN result with no message; evaluators fill in the rest.
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            status: Status::Green,
            message: String::new(),
            value: 0.0,
            details: Vec::new(),
            review_status: String::new(),
            remediation: String::new(),
            potential_action_user: String::new(),
            potential_action_developer: String::new(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_analyzed: usize,
    pub red_count: usize,
    pub yellow_count: usize,
    pub green_count: usize,
}

impl Summary {
    /// Count results per status.
    ///
    /// # Examples
    ///
    /// ```
    /// use metriage_common::types::{EvaluationResult, Status, Summary};
    ///
    /// let mut red = EvaluationResult::new("a");
    /// red.status = Status::Red;
    /// let green = EvaluationResult::new("b");
    /// let summary = Summary::tally(&[red, green]);
    /// assert_eq!(summary.total_analyzed, 2);
    /// assert_eq!(summary.red_count, 1);
    /// assert_eq!(summary.green_count, 1);
    /// ```
    pub fn tally(results: &[EvaluationResult]) -> Self {
        let mut summary = Summary {
            total_analyzed: results.len(),
            ..Summary::default()
        };
        for result in results {
            match result.status {
                Status::Red => summary.red_count += 1,
                Status::Yellow => summary.yellow_count += 1,
                Status::Green => summary.green_count += 1,
            }
        }
        summary
    }
}

/// Aggregate output of one analysis run. Reporters only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub cluster_name: String,
    /// Detected or user supplied; empty when neither is available
    pub acs_version: String,
    pub load_level: LoadLevel,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<EvaluationResult>,
    pub summary: Summary,
}

impl AnalysisReport {
    /// Results with the given status, sorted by rule name.
    pub fn results_with_status(&self, status: Status) -> Vec<&EvaluationResult> {
        let mut filtered: Vec<&EvaluationResult> =
            self.results.iter().filter(|r| r.status == status).collect();
        filtered.sort_by(|a, b| a.rule_name.cmp(&b.rule_name));
        filtered
    }
}
