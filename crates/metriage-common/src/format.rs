//! Human-friendly number rendering shared by evaluators and reporters.

/// Format with two decimals and a space as thousands separator.
///
/// # Examples
///
/// ```
/// use metriage_common::format::human_number;
///
/// assert_eq!(human_number(1234567.891), "1 234 567.89");
/// assert_eq!(human_number(-42.0), "-42.00");
/// ```
pub fn human_number(value: f64) -> String {
    let raw = format!("{value:.2}");
    let (sign, unsigned) = split_sign(&raw);
    match unsigned.split_once('.') {
        Some((int_part, frac_part)) if !frac_part.is_empty() => {
            format!("{sign}{}.{frac_part}", group_thousands(int_part))
        }
        _ => format!("{sign}{}", group_thousands(unsigned)),
    }
}

/// Format rounded to an integer with a space as thousands separator.
///
/// # Examples
///
/// ```
/// use metriage_common::format::human_integer;
///
/// assert_eq!(human_integer(15000.4), "15 000");
/// assert_eq!(human_integer(999.0), "999");
/// ```
pub fn human_integer(value: f64) -> String {
    let raw = format!("{value:.0}");
    let (sign, unsigned) = split_sign(&raw);
    format!("{sign}{}", group_thousands(unsigned))
}

fn split_sign(raw: &str) -> (&str, &str) {
    match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}
