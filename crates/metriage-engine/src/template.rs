//! `{name}` / `{name:spec}` message interpolation.
//!
//! Supported specs are `.Nf`, `f`, `.Ne`, `e`, `d`, `s` and `v`. A token
//! whose name is not bound, or whose spec is not understood, is copied to
//! the output unchanged.

/// A value that can be substituted into a message template.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Number(f64),
    Text(String),
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Binding::Number(value)
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Binding::Text(value)
    }
}

/// Render `template` against `bindings`.
///
/// # Examples
///
/// ```
/// use metriage_engine::template::{render, Binding};
///
/// let msg = render(
///     "{value} pods, p95 {p95:.3f}s, {unknown}",
///     &[("value", Binding::Number(12.4)), ("p95", Binding::Number(0.05))],
/// );
/// assert_eq!(msg, "12 pods, p95 0.050s, {unknown}");
/// ```
pub fn render(template: &str, bindings: &[(&str, Binding)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let token = &after[..close];
        match render_token(token, bindings) {
            Some(rendered) => out.push_str(&rendered),
            None => {
                out.push('{');
                out.push_str(token);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn render_token(token: &str, bindings: &[(&str, Binding)]) -> Option<String> {
    let (name, spec) = match token.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (token, None),
    };
    let (_, binding) = bindings.iter().find(|(n, _)| *n == name)?;

    match binding {
        Binding::Text(text) => Some(text.clone()),
        Binding::Number(value) => match spec {
            None if name == "value" => Some(format!("{value:.0}")),
            None => Some(shortest(*value)),
            Some(spec) => format_number(*value, spec),
        },
    }
}

fn format_number(value: f64, spec: &str) -> Option<String> {
    match spec {
        "s" | "v" => return Some(shortest(value)),
        "f" => return Some(format!("{value:.6}")),
        "e" => return Some(exponent(value, 6)),
        "d" => return Some(format!("{}", value.round() as i64)),
        _ => {}
    }

    let digits = spec.strip_prefix('.')?;
    if let Some(precision) = digits.strip_suffix('f') {
        let precision: usize = precision.parse().ok()?;
        return Some(format!("{value:.precision$}"));
    }
    if let Some(precision) = digits.strip_suffix('e') {
        return Some(exponent(value, precision.parse().ok()?));
    }
    None
}

fn shortest(value: f64) -> String {
    format!("{value}")
}

/// Scientific notation with a signed, two digit exponent (`1.50e+03`).
fn exponent(value: f64, precision: usize) -> String {
    let raw = format!("{value:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            Err(_) => raw,
        },
        None => raw,
    }
}
