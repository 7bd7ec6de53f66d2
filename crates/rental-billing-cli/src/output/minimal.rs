use serde_json::Value;

use super::cell;

/// The single figure each command is usually run for, in lookup order.
const HEADLINE_FIELDS: [&str; 7] = [
    "total",
    "total_cost",
    "pretax_cost",
    "total_due",
    "end_date",
    "electricity_total",
    "average_unit_price",
];

/// Print just the headline figure of a computation, falling back to the
/// first field of the result.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        println!("{}", cell(result));
        return;
    };

    let headline = HEADLINE_FIELDS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()));
    match headline {
        Some(val) => println!("{}", cell(val)),
        None => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, cell(val));
            }
        }
    }
}
