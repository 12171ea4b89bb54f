/// Errors raised while loading or validating rule definitions.
///
/// # Examples
///
/// ```rust
/// use metriage_rules::error::RuleError;
///
/// let err = RuleError::Validation("metric_name is required for gauge rules".to_string());
/// assert!(err.to_string().contains("metric_name"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A rule file or directory could not be read.
    #[error("Rules: failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the rule schema.
    #[error("Rules: failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The rule parsed but violates a structural constraint.
    #[error("Rules: validation failed: {0}")]
    Validation(String),

    /// Wraps any of the above with the offending file.
    #[error("Rules: failed to load rule {path}: {source}")]
    File {
        path: String,
        source: Box<RuleError>,
    },
}

impl RuleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RuleError::Validation(reason.into())
    }
}

/// Convenience `Result` alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
