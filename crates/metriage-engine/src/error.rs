use metriage_metrics::error::MetricsError;
use metriage_rules::error::RuleError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine: rules directory is required")]
    RulesDirRequired,

    #[error("Engine: failed to load rules: {0}")]
    Rules(#[from] RuleError),

    #[error("Engine: failed to parse metrics: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Engine: invalid load level override: {0}")]
    InvalidLoadLevel(String),

    #[error("Engine: invalid ACS version override: {0}")]
    InvalidAcsVersion(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
