//! Turning the many ways marketplaces print a price into a number.

use serde_json::Value;

/// Parses a display price such as `"1.234"`, `"$1,299.99"` or `"12,50"`.
///
/// Currency symbols, spaces and letters are stripped. When both `.` and `,`
/// appear, the last one is the decimal separator. When only one kind appears,
/// it is a thousands separator if it repeats or is followed by exactly three
/// digits, otherwise a decimal separator.
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return None;
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimal_sep = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => lone_separator_as_decimal(&cleaned, '.'),
        (None, Some(_)) => lone_separator_as_decimal(&cleaned, ','),
        (None, None) => None,
    };

    let normalized: String = cleaned
        .chars()
        .filter_map(|c| match c {
            d if d.is_ascii_digit() => Some(d),
            s if Some(s) == decimal_sep => Some('.'),
            _ => None,
        })
        .collect();

    normalized
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn lone_separator_as_decimal(cleaned: &str, sep: char) -> Option<char> {
    if cleaned.matches(sep).count() > 1 {
        return None;
    }
    let idx = cleaned.rfind(sep)?;
    let digits_after = cleaned.len() - idx - 1;
    (digits_after != 3).then_some(sep)
}

/// Reads a price from a JSON field that may be a number or a display string.
pub fn price_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p >= 0.0),
        Value::String(s) => parse_price_text(s),
        _ => None,
    }
}
