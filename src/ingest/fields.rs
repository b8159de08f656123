// src/ingest/fields.rs
//! Small helpers for pulling display values out of loosely-typed payloads.

use serde_json::Value;

pub const NOT_SPECIFIED: &str = "Not specified";

/// Opaque display amount. Null, zero, empty and `false` count as absent.
pub fn amount(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) => {
            if n.as_f64() == Some(0.0) {
                None
            } else {
                Some(n.to_string())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "0" {
                None
            } else {
                Some(s.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

/// `"min–max cur"`, `"from min cur"`, `"to max cur"` or `"Not specified"`.
pub fn format_salary(min: Option<String>, max: Option<String>, currency: Option<&str>) -> String {
    let cur = currency.map(str::trim).unwrap_or("");
    let with_cur = |s: String| {
        if cur.is_empty() {
            s
        } else {
            format!("{s} {cur}")
        }
    };
    match (min, max) {
        (Some(lo), Some(hi)) => with_cur(format!("{lo}–{hi}")),
        (Some(lo), None) => with_cur(format!("from {lo}")),
        (None, Some(hi)) => with_cur(format!("to {hi}")),
        (None, None) => NOT_SPECIFIED.to_string(),
    }
}

/// Non-blank trimmed string.
pub fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
