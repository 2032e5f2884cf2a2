//! Display formatting for provider values.

use serde_json::Value;

use crate::records::UNKNOWN;

/// `425` minutes → `"7h 5m"`. Missing or zero → `"Unknown"`.
pub fn format_duration(minutes: Option<u64>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => UNKNOWN.to_string(),
    }
}

/// Read a minute count from an integer, a float or a numeric string.
/// Negative and non-numeric values yield `None`.
pub fn minutes(value: Option<&Value>) -> Option<u64> {
    let raw = match value? {
        Value::Number(n) => match n.as_u64() {
            Some(m) => return Some(m),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (raw.is_finite() && raw >= 0.0).then(|| raw.round() as u64)
}

/// Numeric rating → `"4.5/5.0"`. Strings pass through; missing → `"No rating"`.
pub fn format_rating(rating: Option<&Value>) -> String {
    match rating {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v != 0.0 => format!("{:.1}/5.0", v),
            _ => "No rating".to_string(),
        },
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "No rating".to_string(),
    }
}

/// Review count → `"1,234 reviews"`. Strings pass through; missing → `"No reviews"`.
pub fn format_reviews(reviews: Option<&Value>) -> String {
    match reviews {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(count) if count > 0 => format!("{} reviews", group_thousands(count)),
            _ => "No reviews".to_string(),
        },
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "No reviews".to_string(),
    }
}

/// Numeric price → `"512 USD"`. Strings such as `"$120"` pass through.
pub fn format_price(price: Option<&Value>, currency: &str) -> String {
    match price {
        Some(Value::Number(n)) => format!("{} {}", n, currency),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => UNKNOWN.to_string(),
    }
}

/// `0` → `"Direct"`, `1` → `"1 stop"`, otherwise `"N stops"`.
pub fn format_stops(count: usize) -> String {
    match count {
        0 => "Direct".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

/// Render any scalar as text; objects, arrays and null yield `None`.
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
