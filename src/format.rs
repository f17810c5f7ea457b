// src/format.rs - Display formatting shared by the view models
use crate::models::Quantity;

pub const PREVIEW_MAX_CHARS: usize = 200;

/// `12.5ml`, or `fallback` when the quantity or its value is missing.
pub fn format_quantity(quantity: Option<&Quantity>, fallback: &str) -> String {
    match quantity.and_then(|q| q.value.map(|v| (v, q.unit.as_deref().unwrap_or("")))) {
        Some((value, unit)) => format!("{}{}", format_number(value), unit),
        None => fallback.to_string(),
    }
}

/// Date part of an ISO timestamp; non-ISO strings pass through.
pub fn format_date(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.split('T').next().unwrap_or(v).to_string(),
        _ => String::new(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    value.map(|v| format!("{}%", format_number(v))).unwrap_or_default()
}

pub fn format_density(value: Option<f64>, empty: &str) -> String {
    value
        .map(|v| format!("{} g/cm³", format_number(v)))
        .unwrap_or_else(|| empty.to_string())
}

pub fn format_mass(value: Option<f64>, empty: &str) -> String {
    value
        .map(|v| format!("{}g", format_number(v)))
        .unwrap_or_else(|| empty.to_string())
}

pub fn format_volume(value: Option<f64>, unit: &str, empty: &str) -> String {
    value
        .map(|v| format!("{}{}", format_number(v), unit))
        .unwrap_or_else(|| empty.to_string())
}

/// Integers print without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Translated value when present and non-blank, else the original.
pub fn pick_i18n(translated: Option<&str>, fallback: Option<&str>) -> String {
    match translated.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None => fallback.unwrap_or_default().to_string(),
    }
}

/// Collapses whitespace and caps the text at 200 characters, `...` included.
pub fn build_preview(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_MAX_CHARS {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(PREVIEW_MAX_CHARS - 3).collect();
    format!("{}...", truncated.trim_end())
}
