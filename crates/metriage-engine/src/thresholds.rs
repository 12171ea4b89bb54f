use metriage_common::types::LoadLevel;
use metriage_rules::{Rule, Thresholds};

/// Active thresholds for `rule` at `load_level`.
///
/// A load level override replaces `low`, `high` and `higher_is_worse` only
/// when it sets `low` or `high`, and then only the bounds it sets. The
/// histogram and ratio fields are merged one by one when non-zero.
pub fn select_thresholds(rule: &Rule, load_level: LoadLevel) -> Thresholds {
    let defaults = rule.thresholds;
    let Some(selected) = rule
        .load_level_thresholds
        .as_ref()
        .and_then(|overrides| overrides.for_level(load_level))
    else {
        return defaults;
    };

    let mut merged = defaults;
    if selected.low > 0.0 || selected.high > 0.0 {
        if selected.low > 0.0 {
            merged.low = selected.low;
        }
        if selected.high > 0.0 {
            merged.high = selected.high;
        }
        merged.higher_is_worse = selected.higher_is_worse;
    }
    if selected.p95_good != 0.0 {
        merged.p95_good = selected.p95_good;
    }
    if selected.p95_warn != 0.0 {
        merged.p95_warn = selected.p95_warn;
    }
    if selected.min_ratio != 0.0 {
        merged.min_ratio = selected.min_ratio;
    }
    merged
}
