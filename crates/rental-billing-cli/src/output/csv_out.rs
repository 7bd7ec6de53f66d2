use serde_json::Value;
use std::io;

use super::{cell, split_rows};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write the result as `field,value` pairs. Nested row lists (tier charges,
/// receipt lines) follow as their own header + rows blocks, separated by a
/// blank record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            let (scalars, nested) = split_rows(map);
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in scalars {
                let _ = wtr.write_record([key.to_string(), cell(val)]);
            }
            for (name, rows) in nested {
                let _ = wtr.write_record([""]);
                let _ = wtr.write_record([name]);
                write_rows(&mut wtr, rows);
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        other => {
            let _ = wtr.write_record([cell(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for row in rows {
            let _ = wtr.write_record([cell(row)]);
        }
        return;
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&record);
        }
    }
}
