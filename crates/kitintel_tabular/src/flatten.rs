//! JSON → flat rows.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::table::Table;

/// Joins nested object keys into a column name.
pub const PATH_SEPARATOR: char = '.';

/// One leaf combination of a document: dotted path → scalar.
pub type FlatRow = BTreeMap<String, Value>;

/// Flatten a JSON document into a table.
///
/// Deterministic for a given input: object fields are visited in document
/// order and array elements left to right.
pub fn flatten(document: &Value) -> Table {
    Table::from_rows(flatten_at(document, ""))
}

fn flatten_at(value: &Value, path: &str) -> Vec<FlatRow> {
    match value {
        Value::Object(fields) => {
            let mut rows = vec![FlatRow::new()];
            let mut contributed = false;
            for (key, field) in fields {
                let field_path = format!("{}{}{}", path, PATH_SEPARATOR, key);
                let field_rows = flatten_at(field, &field_path);
                contributed |= !field_rows.is_empty();
                rows = cross_join(rows, field_rows);
            }
            // Only the seed row survives when every field was empty.
            if contributed {
                rows
            } else {
                Vec::new()
            }
        }
        // Array membership adds no path segment.
        Value::Array(elements) => elements
            .iter()
            .flat_map(|element| flatten_at(element, path))
            .collect(),
        scalar => {
            let key = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
            vec![FlatRow::from([(key.to_string(), scalar.clone())])]
        }
    }
}

/// Pair every left row with every right row, right fields overwriting left.
///
/// An empty right side leaves `left` untouched so an empty branch never
/// erases data gathered from its siblings.
pub fn cross_join(left: Vec<FlatRow>, right: Vec<FlatRow>) -> Vec<FlatRow> {
    if right.is_empty() {
        return left;
    }
    let mut joined = Vec::with_capacity(left.len() * right.len());
    for left_row in &left {
        for right_row in &right {
            let mut row = left_row.clone();
            row.extend(right_row.iter().map(|(k, v)| (k.clone(), v.clone())));
            joined.push(row);
        }
    }
    joined
}
