//! Foreign-key relation graph and join-path resolution for SELECT.
//!
//! Every field flagged as a foreign key contributes one directed edge from the
//! referenced column to the referencing column. Resolving a selection walks
//! those edges depth-first between consecutive involved tables and produces a
//! `FROM ... JOIN ... ON ...` clause in which every `ON` only mentions tables
//! already in scope.

use crate::error::{SketchError, SketchResult};
use crate::ident::Ident;
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fully qualified column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.table)
    }

    /// `schema`.`table`.`column`
    pub fn ident(&self) -> Ident {
        Ident::column(&self.schema, &self.table, &self.column)
    }

    fn in_table(&self, table: &TableRef) -> bool {
        self.schema == table.schema && self.table == table.title
    }
}

/// How many referencing rows a referenced row may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Directed edge: referenced column (`from`) → referencing column (`to`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: ColumnRef,
    pub to: ColumnRef,
    pub cardinality: Cardinality,
}

impl Relation {
    /// `` `fs`.`ft`.`fc` = `ts`.`tt`.`tc` ``
    pub fn on_clause(&self) -> String {
        format!("{} = {}", self.from.ident(), self.to.ident())
    }
}

/// One `JOIN <table> ON <relation>` fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: TableRef,
    pub relation: Relation,
}

impl Join {
    pub fn to_sql(&self) -> String {
        format!("JOIN {} ON {}", self.table.ident(), self.relation.on_clause())
    }
}

/// Base table plus joins in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub base: TableRef,
    pub joins: Vec<Join>,
}

impl FromClause {
    /// Rendered without the leading `FROM` keyword.
    pub fn to_sql(&self) -> String {
        let mut out = self.base.ident().to_sql();
        for join in &self.joins {
            out.push(' ');
            out.push_str(&join.to_sql());
        }
        out
    }
}

/// Foreign-key edges of a table catalogue.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    relations: Vec<Relation>,
}

impl RelationGraph {
    pub fn from_tables(tables: &[Table]) -> Self {
        let mut relations = Vec::new();
        for table in tables {
            for field in &table.fields {
                let Some(reference) = field.foreign_reference() else {
                    continue;
                };
                let cardinality = if field.is_unique() {
                    Cardinality::One
                } else {
                    Cardinality::Many
                };
                relations.push(Relation {
                    from: ColumnRef::new(&reference.schema, &reference.table, &reference.column),
                    to: ColumnRef::new(&table.schema, &table.title, &field.name),
                    cardinality,
                });
            }
        }
        Self { relations }
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Directed path from `start` to `end`, following edges from their
    /// referenced side. An empty path means `start == end`.
    pub fn find_path(&self, start: &TableRef, end: &TableRef) -> Option<Vec<&Relation>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.walk(start, end, &mut visited, &mut path) {
            tracing::trace!(
                target: "sqlsketch.generate",
                from = %start,
                to = %end,
                hops = path.len(),
                "join path found"
            );
            Some(path)
        } else {
            None
        }
    }

    fn walk<'a>(
        &'a self,
        node: &TableRef,
        end: &TableRef,
        visited: &mut HashSet<TableRef>,
        path: &mut Vec<&'a Relation>,
    ) -> bool {
        if !visited.insert(node.clone()) {
            return false;
        }
        if node == end {
            return true;
        }
        for rel in self.relations.iter().filter(|r| r.from.in_table(node)) {
            path.push(rel);
            if self.walk(&rel.to.table_ref(), end, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Build the FROM clause connecting `involved` (duplicates ignored,
    /// selection order kept).
    pub fn resolve(&self, involved: &[TableRef]) -> SketchResult<FromClause> {
        let mut tables: Vec<&TableRef> = Vec::with_capacity(involved.len());
        for table in involved {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }

        let Some(&first) = tables.first() else {
            return Err(SketchError::missing("no table selected"));
        };
        let Some(&second) = tables.get(1) else {
            return Ok(FromClause {
                base: first.clone(),
                joins: Vec::new(),
            });
        };

        let mut scope = JoinScope::default();
        let base = if let Some(path) = self.find_path(first, second) {
            scope.enter(first);
            scope.forward(&path);
            first
        } else if let Some(path) = self.find_path(second, first) {
            scope.enter(second);
            scope.forward(&path);
            second
        } else {
            return Err(SketchError::unrelated(first.to_string(), second.to_string()));
        };

        for pair in tables.windows(2).skip(1) {
            let (prev, next) = (pair[0], pair[1]);
            if let Some(path) = self.find_path(prev, next) {
                scope.forward(&path);
            } else if let Some(path) = self.find_path(next, prev) {
                scope.backward(&path);
            } else {
                return Err(SketchError::unrelated(prev.to_string(), next.to_string()));
            }
        }

        Ok(FromClause {
            base: base.clone(),
            joins: scope.joins,
        })
    }
}

/// Tables in scope while joins are accumulated.
#[derive(Default)]
struct JoinScope {
    joined: Vec<TableRef>,
    joins: Vec<Join>,
}

impl JoinScope {
    fn enter(&mut self, table: &TableRef) {
        if !self.joined.contains(table) {
            self.joined.push(table.clone());
        }
    }

    fn join(&mut self, table: TableRef, relation: &Relation) {
        if self.joined.contains(&table) {
            return;
        }
        self.joined.push(table.clone());
        self.joins.push(Join {
            table,
            relation: relation.clone(),
        });
    }

    /// Path starts at a joined table: join each edge's referencing side.
    fn forward(&mut self, path: &[&Relation]) {
        for rel in path {
            self.join(rel.to.table_ref(), rel);
        }
    }

    /// Path ends at a joined table: walk it back, joining each referenced side.
    fn backward(&mut self, path: &[&Relation]) {
        for rel in path.iter().rev() {
            self.join(rel.from.table_ref(), rel);
        }
    }
}
