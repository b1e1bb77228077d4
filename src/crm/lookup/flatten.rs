use std::collections::HashSet;

use serde_json::Value;

use crate::crm::lookup::model::{Record, RecordSet};

/// One table cell. `None` marks a field the record did not carry.
pub type Cell = Option<Value>;

/// Flattened, ordered view of a record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table directly. Rows are padded with absent cells or cut to
    /// the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuilds records from the table, leaving out absent cells.
    pub fn to_records(&self) -> RecordSet {
        let records = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .filter_map(|(column, cell)| {
                        cell.as_ref().map(|value| (column.clone(), value.clone()))
                    })
                    .collect::<Record>()
            })
            .collect();
        RecordSet::new(records)
    }
}

/// Flattens records into a table.
///
/// Fields holding nested objects (relationships, the `attributes` envelope)
/// are dropped. Columns are the union of the remaining field names in
/// first-seen order; rows keep the record order.
pub fn flatten(records: &RecordSet) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records.records() {
        for (field, value) in record {
            if is_nested(value) {
                continue;
            }
            if seen.insert(field.as_str()) {
                columns.push(field.clone());
            }
        }
    }

    let rows = records
        .records()
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.get(column).filter(|value| !is_nested(value)).cloned())
                .collect()
        })
        .collect();

    Table { columns, rows }
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Text form of a cell as shown on screen and written to CSV.
///
/// Absent cells and JSON `null` are blank.
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(other) => other.to_string(),
    }
}
