use super::{present, require_table_info};
use crate::error::{SketchError, SketchResult};
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    pub table: TableRef,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    /// Permit a DELETE without WHERE.
    #[serde(default)]
    pub allow_delete_all: bool,
}

impl DeleteOptions {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            where_clause: None,
            allow_delete_all: false,
        }
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn allow_delete_all(mut self, allow: bool) -> Self {
        self.allow_delete_all = allow;
        self
    }
}

/// `DELETE FROM ... WHERE ...;`
pub fn generate_delete(table: &Table, opts: &DeleteOptions) -> SketchResult<String> {
    require_table_info(table, "a DELETE statement")?;

    match present(&opts.where_clause) {
        Some(clause) => Ok(format!("DELETE FROM {} WHERE {};", table.ident(), clause)),
        None if opts.allow_delete_all => Ok(format!("DELETE FROM {};", table.ident())),
        None => Err(SketchError::missing(
            "WHERE clause is required for DELETE (set allow_delete_all to delete every row)",
        )),
    }
}
