pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter. Pre-rendered text (the
/// plain receipt) is printed as-is whatever the format.
pub fn format_output(format: &OutputFormat, value: &Value) {
    if let Value::String(text) = value {
        println!("{}", text);
        return;
    }
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Split a result object into scalar fields and nested row lists
/// (`charges`, `lines`, `lines` of a water charge).
pub(crate) fn split_rows(
    map: &serde_json::Map<String, Value>,
) -> (Vec<(&str, &Value)>, Vec<(&str, &[Value])>) {
    let mut scalars = Vec::new();
    let mut nested = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(items) if items.iter().any(Value::is_object) => {
                nested.push((key.as_str(), items.as_slice()));
            }
            _ => scalars.push((key.as_str(), val)),
        }
    }
    (scalars, nested)
}

pub(crate) fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
