use num_format::{Locale, ToFormattedString};

/// Placeholder shown for missing values.
pub const MISSING: &str = "-";

pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => MISSING.to_string(),
    }
}

/// Whole number with thousands separators, e.g. `12,345`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let rounded = value.round();
    if rounded.abs() >= i64::MAX as f64 {
        return format!("{rounded:.0}");
    }
    (rounded as i64).to_formatted_string(&Locale::en)
}

pub fn format_optional_number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| MISSING.to_string())
}
