use super::{FieldValue, literal, require_table_info};
use crate::error::{SketchError, SketchResult};
use crate::ident::quote;
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOptions {
    pub table: TableRef,
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

impl InsertOptions {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push(FieldValue::new(name, value));
        self
    }
}

/// `INSERT INTO ... (cols) VALUES (...);` over the entries that carry a value.
pub fn generate_insert(table: &Table, opts: &InsertOptions) -> SketchResult<String> {
    require_table_info(table, "an INSERT statement")?;

    let (columns, values): (Vec<String>, Vec<String>) = opts
        .values
        .iter()
        .filter_map(|fv| fv.value().map(|v| (quote(&fv.name), literal(v))))
        .unzip();

    if columns.is_empty() {
        return Err(SketchError::missing("at least one field must be filled"));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table.ident(),
        columns.join(", "),
        values.join(", ")
    ))
}
