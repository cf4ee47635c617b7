use super::{FieldAction, FieldDraft, column_definition};
use crate::error::{SketchError, SketchResult};
use crate::ident::{Ident, quote, quote_list};
use crate::model::{Index, IndexKind, Table, TableRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Edits submitted for an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterOptions {
    /// The live table being edited.
    pub table: TableRef,
    /// New schema, when renaming.
    #[serde(default)]
    pub schema: Option<String>,
    /// New title, when renaming.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
    #[serde(default)]
    pub index: Vec<Index>,
}

impl AlterOptions {
    /// Options that leave `table` untouched; edit them with the builder methods.
    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.table_ref(),
            schema: Some(table.schema.clone()),
            title: Some(table.title.clone()),
            fields: table.fields.iter().map(FieldDraft::from).collect(),
            index: table.index.clone(),
        }
    }

    pub fn rename(mut self, schema: impl Into<String>, title: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self.title = Some(title.into());
        self
    }

    pub fn add_field(mut self, draft: FieldDraft) -> Self {
        self.fields.push(draft.with_action(FieldAction::Add));
        self
    }

    /// Replace the draft with the same name and mark it modified.
    pub fn modify_field(mut self, draft: FieldDraft) -> Self {
        let draft = draft.with_action(FieldAction::Modify);
        let position = self.fields.iter().position(|d| d.name() == draft.name());
        match position {
            Some(i) => self.fields[i] = draft,
            None => self.fields.push(draft),
        }
        self
    }

    pub fn remove_field(mut self, name: &str) -> Self {
        if let Some(draft) = self.fields.iter_mut().find(|d| d.name() == Some(name)) {
            draft.action = FieldAction::Remove;
        }
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.index.push(index);
        self
    }

    pub fn drop_index(mut self, name: &str) -> Self {
        self.index.retain(|i| i.name != name);
        self
    }

    /// Schema and title after the edit.
    pub fn new_identity<'a>(&'a self, live: &'a TableRef) -> (&'a str, &'a str) {
        let schema = self.schema.as_deref().filter(|s| !s.is_empty()).unwrap_or(&live.schema);
        let title = self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&live.title);
        (schema, title)
    }

    /// Primary-key names over the drafts that survive the edit.
    pub fn primary_key(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|d| d.is_pk && !d.is_removed())
            .filter_map(|d| d.name())
            .collect()
    }

    /// Submitted indexes plus the `<f>_UNIQUE` entries implied by newly unique fields.
    pub fn effective_index(&self, live: &Table) -> Vec<Index> {
        let mut index = self.index.clone();
        for draft in &self.fields {
            let Some(name) = draft.name() else {
                continue;
            };
            let newly_unique = match draft.action {
                FieldAction::Add => draft.is_unique(),
                FieldAction::Modify => {
                    draft.is_unique() && !live.field(name).is_some_and(|f| f.is_unique())
                }
                FieldAction::Remove | FieldAction::Unchanged => false,
            };
            if !newly_unique {
                continue;
            }
            let synthetic = Index::unique_for(name);
            if !index.iter().any(|i| i.same_shape(&synthetic)) {
                index.push(synthetic);
            }
        }
        index
    }
}

/// `ALTER TABLE ... clause,\n\tclause;` or an empty string when nothing changed.
pub fn generate_alter(table: &Table, opts: &AlterOptions) -> SketchResult<String> {
    let mut clauses = Vec::new();

    for (i, draft) in opts.fields.iter().enumerate() {
        if draft.action == FieldAction::Unchanged {
            continue;
        }
        let Some(name) = draft.name() else {
            return Err(SketchError::missing(format!("field {} has no name", i + 1)));
        };
        match draft.action {
            FieldAction::Add | FieldAction::Modify => {
                let Some(ty) = draft.ty() else {
                    return Err(SketchError::missing(format!("field \"{name}\" has no type")));
                };
                let verb = if draft.action == FieldAction::Add {
                    "ADD COLUMN"
                } else {
                    "MODIFY COLUMN"
                };
                clauses.push(format!(
                    "{verb} {}",
                    column_definition(name, ty, draft.constraints.as_ref())
                ));
            }
            FieldAction::Remove => clauses.push(format!("DROP COLUMN {}", quote(name))),
            FieldAction::Unchanged => {}
        }
    }

    let live_pk: BTreeSet<&str> = table.primary_key().into_iter().collect();
    let new_pk = opts.primary_key();
    if live_pk != new_pk.iter().copied().collect::<BTreeSet<_>>() {
        match (live_pk.is_empty(), new_pk.is_empty()) {
            (_, true) => clauses.push("DROP PRIMARY KEY".to_string()),
            (true, false) => clauses.push(format!("ADD PRIMARY KEY ({})", quote_list(&new_pk))),
            (false, false) => clauses.push(format!(
                "DROP PRIMARY KEY, ADD PRIMARY KEY ({})",
                quote_list(&new_pk)
            )),
        }
    }

    let submitted = opts.effective_index(table);
    for live in &table.index {
        if submitted.iter().any(|i| i.same_shape(live)) {
            continue;
        }
        match live.kind {
            IndexKind::Fk => clauses.push(format!("DROP FOREIGN KEY {}", quote(&live.name))),
            IndexKind::Unique | IndexKind::Index => {
                clauses.push(format!("DROP INDEX {}", quote(&live.name)))
            }
            IndexKind::Pk => {}
        }
    }
    for index in &submitted {
        if table.index.iter().any(|i| i.same_shape(index)) {
            continue;
        }
        match index.kind {
            IndexKind::Fk => {
                if let Some(clause) = add_foreign_key(opts, index) {
                    clauses.push(clause);
                }
            }
            IndexKind::Unique => clauses.push(format!(
                "ADD UNIQUE {} ({})",
                quote(&index.name),
                quote_list(&index.fields)
            )),
            IndexKind::Index => clauses.push(format!(
                "ADD INDEX {} ({})",
                quote(&index.name),
                quote_list(&index.fields)
            )),
            IndexKind::Pk => {}
        }
    }

    let live = table.table_ref();
    let (schema, title) = opts.new_identity(&live);
    if schema != live.schema || title != live.title {
        clauses.insert(0, format!("RENAME TO {}", Ident::table(schema, title)));
    }

    if clauses.is_empty() {
        return Ok(String::new());
    }
    Ok(format!("ALTER TABLE {} {};", table.ident(), clauses.join(",\n\t")))
}

fn add_foreign_key(opts: &AlterOptions, index: &Index) -> Option<String> {
    let field = index.fields.first()?;
    let reference = opts
        .fields
        .iter()
        .filter(|d| !d.is_removed())
        .find(|d| d.name() == Some(field.as_str()))?
        .references
        .as_ref()?;
    Some(format!(
        "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        quote(&index.name),
        quote(field),
        Ident::table(&reference.schema, &reference.table),
        quote(&reference.column)
    ))
}
