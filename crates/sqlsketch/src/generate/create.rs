use super::{FieldDraft, column_definition};
use crate::error::{SketchError, SketchResult};
use crate::ident::{Ident, quote, quote_list};
use crate::model::{Index, IndexKind, Table, TableRef};
use serde::{Deserialize, Serialize};

/// A table as entered for CREATE TABLE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<Index>,
}

impl CreateOptions {
    pub fn new(schema: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Options that recreate `table` as it is.
    pub fn from_table(table: &Table) -> Self {
        Self {
            schema: Some(table.schema.clone()),
            title: Some(table.title.clone()),
            fields: table.fields.iter().map(FieldDraft::from).collect(),
            index: table.index.clone(),
        }
    }

    pub fn field(mut self, draft: FieldDraft) -> Self {
        self.fields.push(draft);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.index.push(index);
        self
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref().filter(|s| !s.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    pub fn table_ref(&self) -> Option<TableRef> {
        Some(TableRef::new(self.schema()?, self.title()?))
    }

    /// The table these options describe. Fails like [`generate_create`] on missing input.
    pub fn to_table(&self) -> SketchResult<Table> {
        let (schema, title) = self.require_identity()?;
        let mut table = Table::new(schema, title);
        for (i, draft) in self.fields.iter().enumerate() {
            let field = draft
                .to_field()
                .ok_or_else(|| incomplete_field(i, draft))?;
            table.fields.push(field);
        }
        table.index = self.index.clone();
        Ok(table)
    }

    fn require_identity(&self) -> SketchResult<(&str, &str)> {
        match (self.schema(), self.title()) {
            (Some(schema), Some(title)) => Ok((schema, title)),
            _ => Err(SketchError::missing(
                "table information is required to generate a CREATE TABLE script",
            )),
        }
    }
}

fn incomplete_field(position: usize, draft: &FieldDraft) -> SketchError {
    match draft.name() {
        Some(name) => SketchError::missing(format!("field \"{name}\" has no type")),
        None => SketchError::missing(format!("field {} has no name", position + 1)),
    }
}

/// ```text
/// CREATE TABLE `s`.`t` (
/// `id` INT NOT NULL AUTO_INCREMENT,
/// PRIMARY KEY (`id`),
/// UNIQUE INDEX `code_UNIQUE` (`code` ASC) VISIBLE
/// );
/// ```
pub fn generate_create(opts: &CreateOptions) -> SketchResult<String> {
    let (schema, title) = opts.require_identity()?;
    if opts.fields.is_empty() {
        return Err(SketchError::missing("table must have at least one field"));
    }

    let mut lines = Vec::with_capacity(opts.fields.len() + opts.index.len() + 1);
    let mut primary_key = Vec::new();
    for (i, draft) in opts.fields.iter().enumerate() {
        let (Some(name), Some(ty)) = (draft.name(), draft.ty()) else {
            return Err(incomplete_field(i, draft));
        };
        lines.push(column_definition(name, ty, draft.constraints.as_ref()));
        if draft.is_pk {
            primary_key.push(name);
        }
    }

    if !primary_key.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", quote_list(&primary_key)));
    }

    // unique fields without a declared unique index get the synthetic one
    for name in opts.fields.iter().filter(|d| d.is_unique()).filter_map(|d| d.name()) {
        let declared = opts
            .index
            .iter()
            .any(|i| i.kind == IndexKind::Unique && i.covers(name));
        if !declared {
            lines.push(unique_index(&Index::unique_for(name)));
        }
    }

    for index in &opts.index {
        match index.kind {
            IndexKind::Unique => lines.push(unique_index(index)),
            IndexKind::Index => lines.push(format!(
                "INDEX {} ({}) VISIBLE",
                quote(&index.name),
                ascending(&index.fields)
            )),
            IndexKind::Fk => {
                let reference = index.fields.first().and_then(|f| {
                    opts.fields
                        .iter()
                        .find(|d| d.name() == Some(f.as_str()))
                        .and_then(|d| d.references.as_ref())
                        .map(|r| (f, r))
                });
                if let Some((field, r)) = reference {
                    lines.push(format!(
                        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                        quote(&index.name),
                        quote(field),
                        Ident::table(&r.schema, &r.table),
                        quote(&r.column)
                    ));
                }
            }
            IndexKind::Pk => {}
        }
    }

    Ok(format!(
        "CREATE TABLE {} (\n{}\n);",
        Ident::table(schema, title),
        lines.join(",\n")
    ))
}

fn unique_index(index: &Index) -> String {
    format!(
        "UNIQUE INDEX {} ({}) VISIBLE",
        quote(&index.name),
        ascending(&index.fields)
    )
}

fn ascending(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ASC", quote(f)))
        .collect::<Vec<_>>()
        .join(", ")
}
