//! Option validation.
//!
//! Everything here is a pure predicate: nothing errors and nothing is
//! mutated. [`validate_options`] runs the checks for one [`Query`] and returns
//! a [`Verdict`] carrying the first problem found, worded for the end user.

mod where_clause;


pub use where_clause::{WhereScope, valid_where_clause};

use crate::error::{SketchError, SketchResult};
use crate::generate::{
    AlterOptions, CreateOptions, DeleteOptions, FieldDraft, FieldValue, InsertOptions, Query,
    SelectOptions, UpdateOptions,
};
use crate::model::{Constraints, Table, TableRef};
use crate::project::Project;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Base type keywords accepted in field definitions.
pub const DATA_TYPES: &[&str] = &[
    "int", "tinyint", "smallint", "mediumint", "bigint", "bit", "varchar", "char", "text",
    "tinytext", "mediumtext", "longtext", "date", "datetime", "timestamp", "time", "year",
    "float", "double", "decimal", "boolean", "enum", "set", "binary", "varbinary", "tinyblob",
    "mediumblob", "blob", "longblob",
];

const INTEGER_TYPES: &[&str] = &["int", "tinyint", "smallint", "mediumint", "bigint"];
const STRING_TYPES: &[&str] = &["varchar", "char", "text", "tinytext", "mediumtext", "longtext"];
const SIZED_TYPES: &[&str] = &["varchar", "char", "binary", "varbinary"];

/// Outcome of a validation: `ok` plus a message when it is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn into_result(self) -> SketchResult<()> {
        if self.ok {
            Ok(())
        } else {
            Err(SketchError::validation(self.message))
        }
    }
}

impl From<Result<(), String>> for Verdict {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(),
            Err(message) => Self::fail(message),
        }
    }
}

fn name_regex() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid built-in name regex")
    })
}

fn type_regex() -> &'static Regex {
    static TYPE_RE: OnceLock<Regex> = OnceLock::new();
    TYPE_RE.get_or_init(|| {
        Regex::new(r"^(?P<base>[a-z]+)(?:\((?P<param>[^)]+)\))?$").expect("invalid built-in type regex")
    })
}

fn digits_regex() -> &'static Regex {
    static DIGITS_RE: OnceLock<Regex> = OnceLock::new();
    DIGITS_RE.get_or_init(|| Regex::new(r"^\d+$").expect("invalid built-in digits regex"))
}

fn integer_regex() -> &'static Regex {
    static INTEGER_RE: OnceLock<Regex> = OnceLock::new();
    INTEGER_RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("invalid built-in integer regex"))
}

/// Split `VARCHAR(45)` into `("varchar", Some("45"))`. `None` when malformed.
pub fn split_type(ty: &str) -> Option<(String, Option<String>)> {
    let lower = ty.trim().to_ascii_lowercase();
    let caps = type_regex().captures(&lower)?;
    let base = caps.name("base")?.as_str().to_string();
    let param = caps.name("param").map(|m| m.as_str().trim().to_string());
    Some((base, param))
}

/// Identifier check. A missing name is not an error here.
pub fn valid_name(name: Option<&str>) -> bool {
    match name {
        Some(n) if !n.is_empty() => name_regex().is_match(n),
        _ => true,
    }
}

/// Known base type, and unsigned-integer parameters where a length is expected.
pub fn valid_data_type(ty: Option<&str>) -> bool {
    let Some(ty) = ty.filter(|t| !t.is_empty()) else {
        return true;
    };
    let Some((base, param)) = split_type(ty) else {
        return false;
    };
    if !DATA_TYPES.contains(&base.as_str()) {
        return false;
    }
    match param {
        Some(p) if SIZED_TYPES.contains(&base.as_str()) => digits_regex().is_match(&p),
        _ => true,
    }
}

/// Whether `ty` is one of the integer types (`INT`, `BIGINT`, ...).
pub fn is_integer_type(ty: &str) -> bool {
    split_type(ty).is_some_and(|(base, _)| INTEGER_TYPES.contains(&base.as_str()))
}

/// Check a literal value (default or DML value) against a column type.
pub fn valid_field_data(data: Option<&str>, ty: Option<&str>, not_null: bool) -> bool {
    let (Some(data), Some(ty)) = (data, ty) else {
        return true;
    };
    if data.is_empty() {
        return true;
    }
    if data == "NULL" {
        return !not_null;
    }

    let Some((base, param)) = split_type(ty) else {
        return false;
    };
    let value = unquote(data);

    match base.as_str() {
        b if INTEGER_TYPES.contains(&b) => integer_regex().is_match(value),
        b if STRING_TYPES.contains(&b) => match param {
            Some(p) => p
                .parse::<usize>()
                .is_ok_and(|bound| value.chars().count() <= bound),
            None => true,
        },
        "date" | "datetime" => parses_as_date(value),
        "float" | "double" | "decimal" => value.trim().parse::<f64>().is_ok(),
        "boolean" => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
        _ => false,
    }
}

/// Strip one pair of surrounding single quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

fn parses_as_date(value: &str) -> bool {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

/// Run the checks that gate generation of `query` against `project`.
pub fn validate_options(query: &Query, project: &Project) -> Verdict {
    let result = match query {
        Query::Select(opts) => check_select(opts, project),
        Query::Insert(opts) => check_insert(opts, project),
        Query::Update(opts) => check_update(opts, project),
        Query::Delete(opts) => check_delete(opts, project),
        Query::Create(opts) => check_create(opts, project),
        Query::Alter(opts) => check_alter(opts, project),
        Query::Drop(opts) => target(project, &opts.table).map(|_| ()),
    };
    result.into()
}

fn target<'p>(project: &'p Project, table: &TableRef) -> Result<&'p Table, String> {
    project
        .table(table)
        .ok_or_else(|| "Table is not selected.".to_string())
}

fn check_select(opts: &SelectOptions, project: &Project) -> Result<(), String> {
    if opts.fields.is_empty() {
        return Err("At least one field must be selected.".into());
    }
    if let Some(clause) = opts.where_clause.as_deref() {
        let scope = WhereScope::Selection {
            fields: &opts.fields,
            tables: project.tables(),
        };
        if !valid_where_clause(Some(clause), &scope) {
            return Err("Where Clause is Incorrect.".into());
        }
    }
    if opts.limit == Some(0) {
        return Err("Limit value is Incorrect.".into());
    }
    Ok(())
}

fn check_values(values: &[FieldValue], table: &Table) -> Result<(), String> {
    if values.iter().all(|v| v.value().is_none()) {
        return Err("At least one field must be filled.".into());
    }
    for entry in values {
        let Some(value) = entry.value() else {
            continue;
        };
        let Some(field) = table.field(&entry.name) else {
            return Err(format!("Unknown field \"{}\".", entry.name));
        };
        if !valid_field_data(Some(value), Some(&field.ty), field.is_not_null()) {
            return Err(format!("Value is incorrect in \"{}\" field.", entry.name));
        }
    }
    Ok(())
}

fn check_insert(opts: &InsertOptions, project: &Project) -> Result<(), String> {
    let table = target(project, &opts.table)?;
    check_values(&opts.values, table)
}

fn check_update(opts: &UpdateOptions, project: &Project) -> Result<(), String> {
    let table = target(project, &opts.table)?;
    check_values(&opts.values, table)?;
    check_required_where(opts.where_clause.as_deref(), table, false)
}

fn check_delete(opts: &DeleteOptions, project: &Project) -> Result<(), String> {
    let table = target(project, &opts.table)?;
    check_required_where(opts.where_clause.as_deref(), table, opts.allow_delete_all)
}

fn check_required_where(clause: Option<&str>, table: &Table, optional: bool) -> Result<(), String> {
    match clause.filter(|c| !c.is_empty()) {
        Some(c) if !valid_where_clause(Some(c), &WhereScope::Table(table)) => {
            Err("Where Clause is Incorrect.".into())
        }
        Some(_) => Ok(()),
        None if optional => Ok(()),
        None => Err("Where Clause must be filled.".into()),
    }
}

fn check_create(opts: &CreateOptions, project: &Project) -> Result<(), String> {
    check_identity(opts.title(), opts.schema())?;
    check_drafts(opts.fields.iter())?;
    if let Some(table) = opts.table_ref() {
        if project.contains(&table) {
            return Err(format!("Table \"{table}\" already exists."));
        }
    }
    Ok(())
}

fn check_alter(opts: &AlterOptions, project: &Project) -> Result<(), String> {
    let live = target(project, &opts.table)?;
    let live_ref = live.table_ref();
    let (schema, title) = opts.new_identity(&live_ref);
    check_identity(Some(title), Some(schema))?;
    check_drafts(opts.fields.iter().filter(|d| !d.is_removed()))?;

    let renamed = TableRef::new(schema, title);
    if renamed != live_ref && project.contains(&renamed) {
        return Err(format!("Table \"{renamed}\" already exists."));
    }
    Ok(())
}

fn check_identity(title: Option<&str>, schema: Option<&str>) -> Result<(), String> {
    if !title.is_some_and(|t| valid_name(Some(t))) {
        return Err("Table title is incorrect.".into());
    }
    if !schema.is_some_and(|s| valid_name(Some(s))) {
        return Err("Table schema is incorrect.".into());
    }
    Ok(())
}

fn check_drafts<'a>(drafts: impl Iterator<Item = &'a FieldDraft>) -> Result<(), String> {
    let mut seen = HashSet::new();
    let mut has_pk = false;
    let mut count = 0;

    for (i, draft) in drafts.enumerate() {
        count += 1;
        let label = draft.name().unwrap_or_default();
        let Some(name) = draft.name().filter(|n| valid_name(Some(*n))) else {
            let shown = if label.is_empty() { (i + 1).to_string() } else { label.to_string() };
            return Err(format!("Name is incorrect in {shown} field."));
        };
        let Some(ty) = draft.ty().filter(|t| valid_data_type(Some(*t))) else {
            return Err(format!("Type is incorrect in \"{name}\" field."));
        };
        let constraints = draft.constraints.clone().unwrap_or_default();
        if constraints.auto_increment && !is_integer_type(ty) {
            return Err(format!(
                "Auto increment can be applied only to INT fields (\"{name}\" field)."
            ));
        }
        if !valid_default(&constraints, ty) {
            return Err(format!("Default value is incorrect in \"{name}\" field."));
        }
        if !seen.insert(name) {
            return Err(format!("Field name \"{name}\" is used more than once."));
        }
        has_pk |= draft.is_pk;
    }

    if count == 0 {
        return Err("Table must have at least one field.".into());
    }
    if !has_pk {
        return Err("Table must have at least one PK.".into());
    }
    Ok(())
}

fn valid_default(constraints: &Constraints, ty: &str) -> bool {
    match constraints.default.as_deref() {
        Some(value) => valid_field_data(Some(value), Some(ty), constraints.not_null),
        None => true,
    }
}

/// Whether the submitted edit differs from the live table at all.
pub fn is_table_altered(table: &Table, opts: &AlterOptions) -> bool {
    let live = table.table_ref();
    let (schema, title) = opts.new_identity(&live);
    if schema != table.schema || title != table.title {
        return true;
    }
    if table.fields.len() != opts.fields.len() || table.index.len() != opts.index.len() {
        return true;
    }
    if opts.index.iter().any(|i| !table.index.iter().any(|l| l.same_shape(i))) {
        return true;
    }
    table.fields.iter().zip(&opts.fields).any(|(field, draft)| {
        draft.is_removed()
            || draft.name() != Some(field.name.as_str())
            || draft.ty() != Some(field.ty.as_str())
            || draft.is_pk != field.is_pk
            || draft.constraints.clone().unwrap_or_default()
                != field.constraints.clone().unwrap_or_default()
    })
}
