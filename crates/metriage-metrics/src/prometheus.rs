//! Line-oriented reader for the Prometheus text exposition format.
//!
//! Lines that do not parse are skipped rather than failing the whole dump;
//! a partially readable snapshot still produces a useful report.

use crate::error::{MetricsError, Result};
use crate::store::{MetricSample, MetricStore};
use std::collections::HashMap;
use std::path::Path;

pub fn parse_file(path: impl AsRef<Path>) -> Result<MetricStore> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| MetricsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let store = parse_str(&content);
    tracing::debug!(path = %path.display(), metrics = store.len(), "Parsed metrics file");
    Ok(store)
}

pub fn parse_str(content: &str) -> MetricStore {
    let mut store = MetricStore::new();
    let mut skipped = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("# EOF") {
            continue;
        }

        if let Some(rest) = line.strip_prefix("# HELP") {
            if let Some((name, help)) = split_directive(rest) {
                store.entry(name).help = Some(help.to_string());
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("# TYPE") {
            if let Some((name, metric_type)) = split_directive(rest) {
                if !metric_type.is_empty() && !metric_type.contains(char::is_whitespace) {
                    store.entry(name).metric_type = Some(metric_type.to_string());
                }
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        match parse_sample_line(line) {
            Some((name, sample)) => store.entry(name).samples.push(sample),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped unparseable metric lines");
    }
    store
}

/// Splits `"  name  rest of text"` into `(name, "rest of text")`.
fn split_directive(rest: &str) -> Option<(&str, &str)> {
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let (name, text) = match rest.split_once(char::is_whitespace) {
        Some((name, text)) => (name, text.trim()),
        None => (rest, ""),
    };
    is_valid_metric_name(name).then_some((name, text))
}

fn parse_sample_line(line: &str) -> Option<(&str, MetricSample)> {
    let (name, labels, rest) = match line.find('{') {
        Some(open) => {
            let close = open + label_block_end(&line[open..])?;
            let labels = parse_labels(&line[open + 1..close]);
            (&line[..open], labels, &line[close + 1..])
        }
        None => {
            let split = line.find(char::is_whitespace)?;
            (&line[..split], HashMap::new(), &line[split..])
        }
    };

    let name = name.trim();
    if !is_valid_metric_name(name) || !rest.starts_with(char::is_whitespace) {
        return None;
    }

    // An optional trailing timestamp is ignored.
    let value = parse_value(rest.split_whitespace().next()?)?;
    Some((name, MetricSample { labels, value }))
}

/// Byte offset of the `}` closing a label block that starts at `raw[0]`.
/// Braces inside quoted label values do not count.
fn label_block_end(raw: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => raw.parse().ok(),
    }
}

/// Parses `key1="value1",key2="value2"`. Quoted values may contain commas
/// and `\"`, `\\`, `\n` escapes.
fn parse_labels(raw: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let mut chars = raw.chars().peekable();

    loop {
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' {
                break;
            }
            chars.next();
            if c != ',' {
                key.push(c);
            }
        }
        if chars.next().is_none() {
            break;
        }
        let key = key.trim().to_string();

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some(other) => value.push(other),
                        None => break,
                    },
                    '"' => break,
                    other => value.push(other),
                }
            }
            while chars.peek().is_some_and(|&c| c != ',') {
                chars.next();
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        if !key.is_empty() {
            labels.insert(key, value);
        }
    }

    labels
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
