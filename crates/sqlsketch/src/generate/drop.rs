use crate::ident::quote;
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropOptions {
    pub table: TableRef,
}

impl DropOptions {
    pub fn new(table: TableRef) -> Self {
        Self { table }
    }
}

/// Drop `table`, first dropping every foreign-key constraint in the other
/// tables that points at it. Statements are newline-joined.
pub fn generate_drop(table: &Table, tables: &[Table]) -> String {
    let target = table.table_ref();
    let mut statements = Vec::new();

    for other in tables.iter().filter(|t| !t.is(&target)) {
        for field in other.fields_referencing(&target) {
            if let Some(index) = other.fk_index_for(&field.name) {
                let statement = format!(
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    other.ident(),
                    quote(&index.name)
                );
                if !statements.contains(&statement) {
                    statements.push(statement);
                }
            }
        }
    }

    statements.push(format!("DROP TABLE {};", table.ident()));
    statements.join("\n")
}
