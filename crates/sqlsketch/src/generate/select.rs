use super::present;
use crate::error::{SketchError, SketchResult};
use crate::graph::RelationGraph;
use crate::ident::Ident;
use crate::model::{Table, TableRef};
use serde::{Deserialize, Serialize};

/// Aggregate function wrapped around a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Max => "MAX",
            Self::Min => "MIN",
        }
    }
}

/// One column picked for the select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedField {
    pub table: TableRef,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

impl SelectedField {
    pub fn new(table: TableRef, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
            aggregate: None,
        }
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    fn expression(&self) -> String {
        let column = Ident::column(&self.table.schema, &self.table.title, &self.column);
        match self.aggregate {
            Some(agg) => format!("{}({})", agg.as_str(), column),
            None => column.to_sql(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptions {
    pub fields: Vec<SelectedField>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl SelectOptions {
    pub fn new(fields: Vec<SelectedField>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn group_by(mut self, clause: impl Into<String>) -> Self {
        self.group_by = Some(clause.into());
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Distinct tables of the selection, in selection order.
    pub fn involved_tables(&self) -> Vec<TableRef> {
        let mut out: Vec<TableRef> = Vec::new();
        for field in &self.fields {
            if !out.contains(&field.table) {
                out.push(field.table.clone());
            }
        }
        out
    }
}

/// `SELECT ... FROM ... [JOIN ...] [WHERE] [GROUP BY] [ORDER BY] [LIMIT];`
pub fn generate_select(tables: &[Table], opts: &SelectOptions) -> SketchResult<String> {
    let involved = opts.involved_tables();
    if let Some(missing) = involved.iter().find(|t| !tables.iter().any(|c| c.is(t))) {
        return Err(SketchError::not_found(format!("table {missing}")));
    }

    let from = RelationGraph::from_tables(tables).resolve(&involved)?;

    let mut columns = Vec::new();
    for table in tables {
        let picked: Vec<&SelectedField> = opts
            .fields
            .iter()
            .filter(|f| table.is(&f.table))
            .collect();
        if picked.is_empty() {
            continue;
        }

        let plain = picked.iter().all(|f| f.aggregate.is_none());
        let covers_all = table
            .fields
            .iter()
            .all(|tf| picked.iter().any(|f| f.column == tf.name));
        if plain && covers_all {
            columns.push(format!("{}.*", table.ident()));
        } else {
            columns.extend(picked.iter().map(|f| f.expression()));
        }
    }

    let mut sql = String::from("SELECT ");
    if opts.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&columns.join(", "));
    sql.push_str(" FROM ");
    sql.push_str(&from.to_sql());

    if let Some(clause) = present(&opts.where_clause) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if let Some(clause) = present(&opts.group_by) {
        sql.push_str(" GROUP BY ");
        sql.push_str(clause);
    }
    if let Some(clause) = present(&opts.order_by) {
        sql.push_str(" ORDER BY ");
        sql.push_str(clause);
    }
    if let Some(limit) = opts.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql.push(';');

    Ok(sql)
}
