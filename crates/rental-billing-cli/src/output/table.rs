use serde_json::{Map, Value};
use tabled::{Table, builder::Builder};

use super::{cell, split_rows};

/// Render a computation as a field/value table, followed by one table per
/// nested row list (tier charges, receipt lines) and then any warnings.
pub fn print_table(value: &Value) {
    let Value::Object(envelope) = value else {
        println!("{}", cell(value));
        return;
    };

    match envelope.get("result") {
        Some(Value::Object(result)) => print_object(result),
        _ => print_object(envelope),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(map: &Map<String, Value>) {
    let (scalars, nested) = split_rows(map);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in scalars {
        builder.push_record([key.to_string(), cell(val)]);
    }
    println!("{}", Table::from(builder));

    for (name, rows) in nested {
        println!("\n{}:", name);
        print_rows(rows);
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h).map(cell).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
