//! Product version parsing and rule applicability.

use crate::model::Rule;
use regex::Regex;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version regex is valid")
});

/// `major.minor[.patch]`, patch defaulting to 0. Compares lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Extracts the first `N.N[.N]` occurrence, so `"v4.8.2-rc1"` parses as 4.8.2.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(raw.trim())?;
        let number = |i: usize| -> Option<u64> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Does `version` satisfy `spec`?
///
/// Specifiers: `"4.7-4.9"` (inclusive range), `">=4.7"`, `"4.7+"` and exact
/// `"4.7"`. Anything unparseable fails closed.
///
/// # Examples
///
/// ```
/// use metriage_rules::version::matches_version;
///
/// assert!(matches_version("4.8.0", "4.7+"));
/// assert!(matches_version("4.8.0", "4.7-4.9"));
/// assert!(!matches_version("5.0.0", "4.7-4.9"));
/// assert!(!matches_version("unknown", "4.7+"));
/// ```
pub fn matches_version(version: &str, spec: &str) -> bool {
    let Some(version) = Version::parse(version) else {
        return false;
    };

    let parts: Vec<&str> = spec.split('-').collect();
    if let [min, max] = parts.as_slice() {
        return match (Version::parse(min), Version::parse(max)) {
            (Some(min), Some(max)) => min <= version && version <= max,
            _ => false,
        };
    }

    if let Some(min) = spec.strip_prefix(">=") {
        return Version::parse(min).is_some_and(|min| version >= min);
    }

    if let Some(min) = spec.strip_suffix('+') {
        return Version::parse(min).is_some_and(|min| version >= min);
    }

    Version::parse(spec).is_some_and(|exact| version == exact)
}

fn at_least(version: &str, bound: &str) -> bool {
    matches!((Version::parse(version), Version::parse(bound)), (Some(v), Some(b)) if v >= b)
}

fn at_most(version: &str, bound: &str) -> bool {
    matches!((Version::parse(version), Version::parse(bound)), (Some(v), Some(b)) if v <= b)
}

/// A rule without constraints applies everywhere. `acs_versions` entries are
/// alternatives; when the list is empty, min and max bounds must all hold.
pub fn is_rule_applicable(rule: &Rule, version: &str) -> bool {
    if !rule.has_version_constraints() {
        return true;
    }

    if !rule.acs_versions.is_empty() {
        return rule
            .acs_versions
            .iter()
            .any(|spec| matches_version(version, spec));
    }

    if !rule.min_acs_version.is_empty() && !at_least(version, &rule.min_acs_version) {
        return false;
    }
    if !rule.max_acs_version.is_empty() && !at_most(version, &rule.max_acs_version) {
        return false;
    }
    true
}

/// Rules applicable to `version`, in their original order. An empty version
/// keeps every rule.
pub fn filter_rules_by_version<'a>(rules: &'a [Rule], version: &str) -> Vec<&'a Rule> {
    if version.is_empty() {
        return rules.iter().collect();
    }
    let filtered: Vec<&Rule> = rules
        .iter()
        .filter(|rule| is_rule_applicable(rule, version))
        .collect();
    tracing::debug!(
        version,
        total = rules.len(),
        applicable = filtered.len(),
        "Filtered rules by version"
    );
    filtered
}
