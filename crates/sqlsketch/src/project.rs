//! The table repository a caller owns and threads through generation.
//!
//! Generators never keep tables between calls; the [`Project`] is where the
//! caller keeps them. Applying a CREATE, ALTER or DROP query updates it the
//! same way the modeling application does once the SQL has been accepted.

use crate::error::{SketchError, SketchResult};
use crate::generate::{AlterOptions, CreateOptions, Query};
use crate::graph::{Relation, RelationGraph};
use crate::model::{IndexKind, Table, TableRef};
use crate::parser::{DdlParser, SkippedStatement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered collection of tables, unique by `(schema, title)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    tables: Vec<Table>,
}

impl Project {
    /// Create an empty project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a project from tables, rejecting duplicates.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> SketchResult<Self> {
        let mut project = Self::new();
        for table in tables {
            project.add_table(table)?;
        }
        Ok(project)
    }

    /// Add a table. Fails if one with the same schema and title exists.
    pub fn add_table(&mut self, table: Table) -> SketchResult<()> {
        let key = table.table_ref();
        if self.contains(&key) {
            return Err(SketchError::Duplicate(key.to_string()));
        }
        tracing::debug!(target: "sqlsketch.project", table = %key, "table added");
        self.tables.push(table);
        Ok(())
    }

    /// Get a table by schema and title.
    pub fn table(&self, key: &TableRef) -> Option<&Table> {
        self.tables.iter().find(|t| t.is(key))
    }

    /// Check if a table exists.
    pub fn contains(&self, key: &TableRef) -> bool {
        self.table(key).is_some()
    }

    /// All tables, in insertion order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Get the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the project is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replace the table at `key`, keeping its position. Returns the old table.
    pub fn replace_table(&mut self, key: &TableRef, table: Table) -> SketchResult<Table> {
        let new_key = table.table_ref();
        if &new_key != key && self.contains(&new_key) {
            return Err(SketchError::Duplicate(new_key.to_string()));
        }
        let slot = self
            .tables
            .iter_mut()
            .find(|t| t.is(key))
            .ok_or_else(|| SketchError::not_found(format!("table {key}")))?;
        Ok(std::mem::replace(slot, table))
    }

    /// Remove a table and clear every foreign key in the other tables that
    /// pointed at it, together with the index backing it.
    pub fn remove_table(&mut self, key: &TableRef) -> SketchResult<Table> {
        let pos = self
            .tables
            .iter()
            .position(|t| t.is(key))
            .ok_or_else(|| SketchError::not_found(format!("table {key}")))?;
        let removed = self.tables.remove(pos);

        for table in &mut self.tables {
            let dangling: Vec<String> = table
                .fields_referencing(key)
                .map(|f| f.name.clone())
                .collect();
            if dangling.is_empty() {
                continue;
            }
            for name in &dangling {
                if let Some(field) = table.field_mut(name) {
                    field.is_fk = false;
                    field.references = None;
                }
            }
            table
                .index
                .retain(|i| !(i.kind == IndexKind::Fk && dangling.iter().any(|d| i.covers(d))));
            tracing::debug!(
                target: "sqlsketch.project",
                table = %table.table_ref(),
                fields = ?dangling,
                "references cleared"
            );
        }

        tracing::debug!(target: "sqlsketch.project", table = %key, "table removed");
        Ok(removed)
    }

    /// Add the table described by a CREATE query.
    pub fn apply_create(&mut self, opts: &CreateOptions) -> SketchResult<TableRef> {
        let table = opts.to_table()?;
        let key = table.table_ref();
        self.add_table(table)?;
        Ok(key)
    }

    /// Rebuild the edited table from an ALTER query: removed fields are
    /// dropped, newly unique fields get their `<f>_UNIQUE` index, and
    /// references to a renamed table follow the rename.
    pub fn apply_alter(&mut self, opts: &AlterOptions) -> SketchResult<TableRef> {
        let live = self
            .table(&opts.table)
            .ok_or_else(|| SketchError::not_found(format!("table {}", opts.table)))?;

        let (schema, title) = opts.new_identity(&opts.table);
        let mut edited = Table::new(schema, title);
        for (i, draft) in opts.fields.iter().enumerate().filter(|(_, d)| !d.is_removed()) {
            let field = draft.to_field().ok_or_else(|| {
                SketchError::missing(format!("field {} needs a name and a type", i + 1))
            })?;
            edited.fields.push(field);
        }
        edited.index = opts
            .effective_index(live)
            .into_iter()
            .filter(|i| i.fields.iter().all(|f| edited.has_field(f)))
            .collect();

        let new_key = edited.table_ref();
        self.replace_table(&opts.table, edited)?;

        if new_key != opts.table {
            self.retarget_references(&opts.table, &new_key);
        }
        Ok(new_key)
    }

    fn retarget_references(&mut self, from: &TableRef, to: &TableRef) {
        for table in &mut self.tables {
            for field in &mut table.fields {
                if let Some(r) = field.references.as_mut().filter(|r| r.points_at(from)) {
                    r.schema = to.schema.clone();
                    r.table = to.title.clone();
                }
            }
        }
    }

    /// Apply a DDL query to the project. DML queries leave it unchanged.
    pub fn apply(&mut self, query: &Query) -> SketchResult<()> {
        match query {
            Query::Create(opts) => self.apply_create(opts).map(|_| ()),
            Query::Alter(opts) => self.apply_alter(opts).map(|_| ()),
            Query::Drop(opts) => self.remove_table(&opts.table).map(|_| ()),
            Query::Select(_) | Query::Insert(_) | Query::Update(_) | Query::Delete(_) => Ok(()),
        }
    }

    /// Foreign-key edges between the project's tables.
    pub fn relations(&self) -> Vec<Relation> {
        RelationGraph::from_tables(&self.tables).relations().to_vec()
    }

    /// Parse a DDL script and add its tables. Returns the skipped statements.
    pub fn load_sql(&mut self, sql: &str) -> SketchResult<Vec<SkippedStatement>> {
        self.load_sql_with(&DdlParser::new(), sql)
    }

    /// Like [`Project::load_sql`] with a configured parser.
    ///
    /// All or nothing: if any parsed table collides with the project or with
    /// another table in the same script, the project is left untouched.
    pub fn load_sql_with(
        &mut self,
        parser: &DdlParser,
        sql: &str,
    ) -> SketchResult<Vec<SkippedStatement>> {
        let outcome = parser.parse(sql);

        let mut seen = HashSet::new();
        for table in &outcome.tables {
            let key = table.table_ref();
            if self.contains(&key) || !seen.insert(key.clone()) {
                return Err(SketchError::Duplicate(key.to_string()));
            }
        }

        for table in outcome.tables {
            self.add_table(table)?;
        }
        Ok(outcome.skipped)
    }
}
