use super::{FieldValue, literal, present, require_table_info};
use crate::error::{SketchError, SketchResult};
use crate::ident::quote;
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOptions {
    pub table: TableRef,
    #[serde(default)]
    pub values: Vec<FieldValue>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

impl UpdateOptions {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            values: Vec::new(),
            where_clause: None,
        }
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push(FieldValue::new(name, value));
        self
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }
}

/// `UPDATE ... SET col = 'v', ... WHERE ...;`. A WHERE clause is always required.
pub fn generate_update(table: &Table, opts: &UpdateOptions) -> SketchResult<String> {
    require_table_info(table, "an UPDATE statement")?;

    let Some(where_clause) = present(&opts.where_clause) else {
        return Err(SketchError::missing("WHERE clause is required for UPDATE"));
    };

    let assignments: Vec<String> = opts
        .values
        .iter()
        .filter(|fv| !fv.name.is_empty())
        .filter_map(|fv| fv.value().map(|v| format!("{} = {}", quote(&fv.name), literal(v))))
        .collect();

    if assignments.is_empty() {
        return Err(SketchError::missing("at least one field must be filled"));
    }

    Ok(format!(
        "UPDATE {} SET {} WHERE {};",
        table.ident(),
        assignments.join(", "),
        where_clause
    ))
}
