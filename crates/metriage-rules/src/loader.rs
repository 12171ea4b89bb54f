use crate::error::{Result, RuleError};
use crate::model::{LoadDetectionRule, Rule, RuleDefinition};
use crate::validator::{validate_load_detection_rule, validate_rule};
use std::path::{Path, PathBuf};

/// Every `*.toml` file directly under `dir`, sorted by path.
fn toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| RuleError::Read {
        path: dir.display().to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| RuleError::Read {
                path: dir.display().to_string(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn with_path(path: &Path, err: RuleError) -> RuleError {
    RuleError::File {
        path: path.display().to_string(),
        source: Box::new(err),
    }
}

/// Parses and validates one rule from TOML text.
pub fn parse_rule(content: &str) -> Result<Rule> {
    let def: RuleDefinition = toml::from_str(content)?;
    validate_rule(def)
}

pub fn load_rule(path: impl AsRef<Path>) -> Result<Rule> {
    let path = path.as_ref();
    read(path).and_then(|content| parse_rule(&content))
}

/// Loads all rules in `dir`. The first invalid file aborts the whole load.
pub fn load_rules(dir: impl AsRef<Path>) -> Result<Vec<Rule>> {
    let dir = dir.as_ref();
    let mut rules = Vec::new();
    for path in toml_files(dir)? {
        let rule = load_rule(&path).map_err(|e| with_path(&path, e))?;
        tracing::debug!(path = %path.display(), rule = %rule.name(), "Loaded rule");
        rules.push(rule);
    }
    tracing::info!(dir = %dir.display(), count = rules.len(), "Loaded rules");
    Ok(rules)
}

pub fn parse_load_detection_rule(content: &str) -> Result<LoadDetectionRule> {
    let rule: LoadDetectionRule = toml::from_str(content)?;
    validate_load_detection_rule(&rule)?;
    Ok(rule)
}

pub fn load_load_detection_rules(dir: impl AsRef<Path>) -> Result<Vec<LoadDetectionRule>> {
    let dir = dir.as_ref();
    let mut rules = Vec::new();
    for path in toml_files(dir)? {
        let rule = read(&path)
            .and_then(|content| parse_load_detection_rule(&content))
            .map_err(|e| with_path(&path, e))?;
        rules.push(rule);
    }
    tracing::info!(dir = %dir.display(), count = rules.len(), "Loaded load detection rules");
    Ok(rules)
}
