use super::paths::unit_for;

/// Text shown for an invalid value
pub(crate) const INVALID_TEXT: &str = "---";

pub(crate) fn format_text_value(path: &str, val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => INVALID_TEXT.to_string(),
        serde_json::Value::Number(n) => match (unit_for(path), n.as_f64()) {
            (Some((unit, precision)), Some(f)) => format!("{:.*}{}", precision, f, unit),
            _ => n.to_string(),
        },
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => val.to_string(),
    }
}
