//! Schema model: tables, fields, constraints, indexes and references.
//!
//! These are plain data. The parser produces them, the generators read them and
//! [`Project`](crate::Project) owns them between calls. JSON shape follows the
//! modeling application (`isPK`, `isFK`, `notNull`, `autoIncrement`, `type`).

use crate::ident::Ident;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema assigned to tables whose `CREATE TABLE` statement has no schema prefix.
pub const DEFAULT_SCHEMA: &str = "New Schema";

/// Value identity of a table: `(schema, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub title: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            title: title.into(),
        }
    }

    /// `schema`.`title`
    pub fn ident(&self) -> Ident {
        Ident::table(&self.schema, &self.title)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.title)
    }
}

/// The foreign column a field points to. May dangle until resolved against a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl Reference {
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

    pub fn points_at(&self, table: &TableRef) -> bool {
        self.schema == table.schema && self.table == table.title
    }
}

/// Column-level constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(rename = "isPK", default)]
    pub is_pk: bool,
    #[serde(rename = "isFK", default)]
    pub is_fk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_pk: false,
            is_fk: false,
            references: None,
            constraints: Some(Constraints::default()),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_pk = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints_mut().not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.constraints_mut().auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints_mut().unique = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.constraints_mut().default = Some(value.into());
        self
    }

    /// Mark the field as a foreign key pointing at `schema.table.column`.
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

    pub fn is_unique(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| c.unique)
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| c.not_null)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| c.auto_increment)
    }

    pub fn default_value(&self) -> Option<&str> {
        self.constraints.as_ref().and_then(|c| c.default.as_deref())
    }

    /// The field's reference, only when it is flagged as a foreign key.
    pub fn foreign_reference(&self) -> Option<&Reference> {
        if self.is_fk { self.references.as_ref() } else { None }
    }
}

/// Kind of a table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Pk,
    Fk,
    Unique,
    Index,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Fk => "fk",
            Self::Unique => "unique",
            Self::Index => "index",
        }
    }
}

/// A named index over one or more fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
    pub fields: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, kind: IndexKind, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            fields,
        }
    }

    /// Foreign-key index backing a single field's reference.
    pub fn foreign_key(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(name, IndexKind::Fk, vec![field.into()])
    }

    /// The `<field>_UNIQUE` index generated for a unique column.
    pub fn unique_for(field: &str) -> Self {
        Self::new(format!("{field}_UNIQUE"), IndexKind::Unique, vec![field.to_string()])
    }

    pub fn covers(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Structural equality: same name, kind and field set (order ignored).
    pub fn same_shape(&self, other: &Index) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|f| other.covers(f))
    }
}

/// A table: schema, title, ordered fields and its indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub schema: String,
    pub title: String,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<Index>,
}

impl Table {
    pub fn new(schema: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            title: title.into(),
            fields: Vec::new(),
            index: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.index.push(index);
        self
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.title)
    }

    pub fn is(&self, table: &TableRef) -> bool {
        self.schema == table.schema && self.title == table.title
    }

    /// `schema`.`title`
    pub fn ident(&self) -> Ident {
        Ident::table(&self.schema, &self.title)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Primary-key field names in field order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_pk)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// The `fk` index that contains `field`, if any.
    pub fn fk_index_for(&self, field: &str) -> Option<&Index> {
        self.index
            .iter()
            .find(|i| i.kind == IndexKind::Fk && i.covers(field))
    }

    /// Foreign-key fields of this table that point at `target`.
    pub fn fields_referencing<'a>(
        &'a self,
        target: &'a TableRef,
    ) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| {
            f.foreign_reference()
                .is_some_and(|r| r.points_at(target))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::new("shop", "orders")
            .with_field(Field::new("id", "INT").primary_key().not_null())
            .with_field(Field::new("customer_id", "INT").references("shop", "customers", "id"))
            .with_field(Field::new("code", "VARCHAR(10)").unique())
            .with_index(Index::foreign_key("fk_orders_customers", "customer_id"))
    }

    #[test]
    fn primary_key_in_field_order() {
        let t = Table::new("s", "t")
            .with_field(Field::new("b", "INT").primary_key())
            .with_field(Field::new("x", "INT"))
            .with_field(Field::new("a", "INT").primary_key());
        assert_eq!(t.primary_key(), vec!["b", "a"]);
    }

    #[test]
    fn fk_index_lookup_by_membership() {
        let t = orders();
        assert_eq!(
            t.fk_index_for("customer_id").map(|i| i.name.as_str()),
            Some("fk_orders_customers")
        );
        assert!(t.fk_index_for("code").is_none());
    }

    #[test]
    fn fields_referencing_matches_schema_and_title() {
        let t = orders();
        let customers = TableRef::new("shop", "customers");
        let other = TableRef::new("other", "customers");
        assert_eq!(t.fields_referencing(&customers).count(), 1);
        assert_eq!(t.fields_referencing(&other).count(), 0);
    }

    #[test]
    fn same_shape_ignores_field_order() {
        let a = Index::new("ix", IndexKind::Index, vec!["a".into(), "b".into()]);
        let b = Index::new("ix", IndexKind::Index, vec!["b".into(), "a".into()]);
        let c = Index::new("ix", IndexKind::Unique, vec!["a".into(), "b".into()]);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn json_uses_application_field_names() {
        let json = serde_json::to_value(orders()).unwrap();
        let id = &json["fields"][0];
        assert_eq!(id["isPK"], true);
        assert_eq!(id["type"], "INT");
        assert_eq!(id["constraints"]["notNull"], true);
        assert_eq!(json["index"][0]["type"], "fk");

        let back: Table = serde_json::from_value(json).unwrap();
        assert_eq!(back, orders());
    }
}
