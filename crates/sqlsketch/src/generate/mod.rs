//! SQL statement generators.
//!
//! Each generator is a pure function from table model(s) plus its own options
//! record to SQL text. [`Query`] tags an options record with its statement
//! kind and [`generate`] dispatches it against a [`Project`].
//!
//! ```
//! use sqlsketch::{Field, Project, Query, Table, TableRef, generate};
//! use sqlsketch::generate::DeleteOptions;
//!
//! let mut project = Project::new();
//! project
//!     .add_table(Table::new("shop", "orders").with_field(Field::new("id", "INT").primary_key()))
//!     .unwrap();
//!
//! let query = Query::Delete(DeleteOptions::new(TableRef::new("shop", "orders")).where_clause("id = 1"));
//! assert_eq!(
//!     generate(&project, &query).unwrap(),
//!     "DELETE FROM `shop`.`orders` WHERE id = 1;"
//! );
//! ```

mod alter;
mod create;
mod delete;
mod drop;
mod insert;
mod select;
mod update;

#[cfg(test)]
mod tests;

pub use alter::{AlterOptions, generate_alter};
pub use create::{CreateOptions, generate_create};
pub use delete::{DeleteOptions, generate_delete};
pub use drop::{DropOptions, generate_drop};
pub use insert::{InsertOptions, generate_insert};
pub use select::{Aggregate, SelectOptions, SelectedField, generate_select};
pub use update::{UpdateOptions, generate_update};

use crate::error::{SketchError, SketchResult};
use crate::ident::quote;
use crate::model::{Constraints, Field, Reference, Table, TableRef};
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement kind of a [`Query`]. `Edit` is the ALTER TABLE flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Edit,
    Drop,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Drop => "drop",
        }
    }

    /// DDL statements change the project; DML statements only read it.
    pub fn is_ddl(&self) -> bool {
        matches!(self, Self::Create | Self::Edit | Self::Drop)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one statement, tagged by kind (`{"kind": "select", ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Query {
    Select(SelectOptions),
    Insert(InsertOptions),
    Update(UpdateOptions),
    Delete(DeleteOptions),
    Create(CreateOptions),
    #[serde(rename = "edit")]
    Alter(AlterOptions),
    Drop(DropOptions),
}

impl Query {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Select(_) => StatementKind::Select,
            Self::Insert(_) => StatementKind::Insert,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
            Self::Create(_) => StatementKind::Create,
            Self::Alter(_) => StatementKind::Edit,
            Self::Drop(_) => StatementKind::Drop,
        }
    }

    /// The existing table the query operates on, if it targets one.
    pub fn target(&self) -> Option<&TableRef> {
        match self {
            Self::Insert(o) => Some(&o.table),
            Self::Update(o) => Some(&o.table),
            Self::Delete(o) => Some(&o.table),
            Self::Alter(o) => Some(&o.table),
            Self::Drop(o) => Some(&o.table),
            Self::Select(_) | Self::Create(_) => None,
        }
    }
}

/// Generate the SQL for `query` against the tables in `project`.
pub fn generate(project: &Project, query: &Query) -> SketchResult<String> {
    let sql = match query {
        Query::Select(opts) => generate_select(project.tables(), opts)?,
        Query::Insert(opts) => generate_insert(selected(project, &opts.table)?, opts)?,
        Query::Update(opts) => generate_update(selected(project, &opts.table)?, opts)?,
        Query::Delete(opts) => generate_delete(selected(project, &opts.table)?, opts)?,
        Query::Create(opts) => generate_create(opts)?,
        Query::Alter(opts) => generate_alter(selected(project, &opts.table)?, opts)?,
        Query::Drop(opts) => generate_drop(selected(project, &opts.table)?, project.tables()),
    };

    tracing::debug!(
        target: "sqlsketch.generate",
        kind = %query.kind(),
        sql = %sql,
        "generated statement"
    );
    Ok(sql)
}

fn selected<'p>(project: &'p Project, table: &TableRef) -> SketchResult<&'p Table> {
    project
        .table(table)
        .ok_or_else(|| SketchError::missing(format!("table is not selected ({table})")))
}

/// What an edit does to a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAction {
    Add,
    Remove,
    Modify,
    #[default]
    Unchanged,
}

/// A field as entered for CREATE or ALTER. Name and type may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(rename = "isPK", default)]
    pub is_pk: bool,
    #[serde(rename = "isFK", default)]
    pub is_fk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default)]
    pub action: FieldAction,
}

impl FieldDraft {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ty: Some(ty.into()),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: FieldAction) -> Self {
        self.action = action;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_pk = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints_mut().not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints_mut().unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.constraints_mut().auto_increment = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.constraints_mut().default = Some(value.into());
        self
    }

    pub fn references(
        mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.is_fk = true;
        self.references = Some(Reference::new(schema, table, column));
        self
    }

    pub fn constraints_mut(&mut self) -> &mut Constraints {
        self.constraints.get_or_insert_with(Constraints::default)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn ty(&self) -> Option<&str> {
        self.ty.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_unique(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| c.unique)
    }

    pub fn is_removed(&self) -> bool {
        self.action == FieldAction::Remove
    }

    /// The finished field, when name and type are both present.
    pub fn to_field(&self) -> Option<Field> {
        Some(Field {
            name: self.name()?.to_string(),
            ty: self.ty()?.to_string(),
            is_pk: self.is_pk,
            is_fk: self.is_fk,
            references: self.references.clone(),
            constraints: self.constraints.clone(),
        })
    }
}

impl From<&Field> for FieldDraft {
    fn from(field: &Field) -> Self {
        Self {
            name: Some(field.name.clone()),
            ty: Some(field.ty.clone()),
            is_pk: field.is_pk,
            is_fk: field.is_fk,
            references: field.references.clone(),
            constraints: field.constraints.clone(),
            action: FieldAction::Unchanged,
        }
    }
}

/// A name/value pair entered for INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// The value, when one was entered.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// `` `name` TYPE [NOT NULL] [AUTO_INCREMENT] [DEFAULT v] ``
pub(crate) fn column_definition(name: &str, ty: &str, constraints: Option<&Constraints>) -> String {
    let mut out = format!("{} {}", quote(name), ty);
    if let Some(c) = constraints {
        if c.not_null {
            out.push_str(" NOT NULL");
        }
        if c.auto_increment {
            out.push_str(" AUTO_INCREMENT");
        }
        if let Some(default) = c.default.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
    }
    out
}

/// Single-quoted literal with `\` and `'` backslash-escaped.
pub(crate) fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// An optional clause that is present and not blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Both halves of the table's identity must be set.
pub(crate) fn require_table_info(table: &Table, statement: &str) -> SketchResult<()> {
    if table.schema.is_empty() || table.title.is_empty() {
        return Err(SketchError::missing(format!(
            "table information is required to generate {statement}"
        )));
    }
    Ok(())
}
