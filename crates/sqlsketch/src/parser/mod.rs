//! DDL parser: multi-statement `CREATE TABLE` text → [`Table`] models.
//!
//! The input is tokenized once and split on top-level `;`. Only statements
//! that start with `CREATE TABLE` and end with `)` are parsed; everything else
//! (including `CREATE DATABASE` / `DROP DATABASE`) is skipped. Parsing never
//! fails as a whole: a malformed statement is recorded in
//! [`ParseOutcome::skipped`] and the remaining statements are still returned.
//!
//! ```
//! use sqlsketch::parse_script;
//!
//! let tables = parse_script(
//!     "CREATE TABLE `shop`.`customers` (`id` INT NOT NULL, PRIMARY KEY (`id`));",
//! );
//! assert_eq!(tables[0].title, "customers");
//! assert!(tables[0].fields[0].is_pk);
//! ```

pub mod lexer;

use crate::model::{DEFAULT_SCHEMA, Field, Index, IndexKind, Reference, Table};
use lexer::{Token, TokenKind, matching_paren, render, split_statements, split_top_level, tokenize};
use std::fmt;

/// Why a statement was not turned into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `CREATE DATABASE`, `DROP DATABASE` and their `SCHEMA` spellings.
    DatabaseStatement,
    /// Anything that is not `CREATE TABLE`.
    NotCreateTable,
    /// `CREATE TABLE` whose last token is not `)`.
    Unterminated,
    /// No table name could be read.
    MissingName,
    /// No parenthesised definition body.
    MissingBody,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseStatement => "database statement",
            Self::NotCreateTable => "not a CREATE TABLE statement",
            Self::Unterminated => "statement does not end with ')'",
            Self::MissingName => "missing table name",
            Self::MissingBody => "missing column definitions",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement the parser dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    /// Zero-based statement position in the script.
    pub index: usize,
    pub reason: SkipReason,
    /// First few tokens of the statement, for messages.
    pub preview: String,
}

/// Tables recovered from a script plus the statements that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub tables: Vec<Table>,
    pub skipped: Vec<SkippedStatement>,
}

/// Parse a DDL script with default settings and return the tables only.
pub fn parse_script(sql: &str) -> Vec<Table> {
    DdlParser::new().parse(sql).tables
}

/// Configurable DDL parser.
#[derive(Debug, Clone)]
pub struct DdlParser {
    default_schema: String,
}

impl Default for DdlParser {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl DdlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema used for tables declared without one (default: `"New Schema"`).
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    pub fn parse(&self, sql: &str) -> ParseOutcome {
        let tokens = tokenize(sql);
        let mut outcome = ParseOutcome::default();

        for (index, stmt) in split_statements(&tokens).into_iter().enumerate() {
            match self.parse_statement(stmt) {
                Ok(table) => {
                    tracing::debug!(
                        target: "sqlsketch.parser",
                        schema = %table.schema,
                        title = %table.title,
                        fields = table.fields.len(),
                        "parsed table"
                    );
                    outcome.tables.push(table);
                }
                Err(reason) => {
                    let preview = render(&stmt[..stmt.len().min(4)]);
                    tracing::debug!(
                        target: "sqlsketch.parser",
                        index,
                        %reason,
                        statement = %preview,
                        "skipped statement"
                    );
                    outcome.skipped.push(SkippedStatement {
                        index,
                        reason,
                        preview,
                    });
                }
            }
        }

        outcome
    }

    fn parse_statement(&self, stmt: &[Token]) -> Result<Table, SkipReason> {
        let kw = |i: usize, word: &str| stmt.get(i).is_some_and(|t| t.is_kw(word));

        if (kw(0, "CREATE") || kw(0, "DROP")) && (kw(1, "DATABASE") || kw(1, "SCHEMA")) {
            return Err(SkipReason::DatabaseStatement);
        }
        if !(kw(0, "CREATE") && kw(1, "TABLE")) {
            return Err(SkipReason::NotCreateTable);
        }
        if !stmt.last().is_some_and(|t| t.is(TokenKind::RParen)) {
            return Err(SkipReason::Unterminated);
        }

        let mut pos = 2;
        if kw(2, "IF") && kw(3, "NOT") && kw(4, "EXISTS") {
            pos = 5;
        }

        let (schema, title, after_name) = read_table_name(stmt, pos).ok_or(SkipReason::MissingName)?;
        let schema = schema.unwrap_or_else(|| self.default_schema.clone());

        let open = stmt[after_name..]
            .iter()
            .position(|t| t.is(TokenKind::LParen))
            .map(|p| p + after_name)
            .ok_or(SkipReason::MissingBody)?;
        let close = matching_paren(stmt, open).ok_or(SkipReason::MissingBody)?;

        let mut builder = TableBuilder::new(schema, title);
        for fragment in split_top_level(&stmt[open + 1..close], TokenKind::Comma) {
            builder.definition(fragment);
        }
        Ok(builder.finish())
    }
}

/// Read `[schema.]title` starting at `pos`. Returns the position after the name.
fn read_table_name(stmt: &[Token], pos: usize) -> Option<(Option<String>, String, usize)> {
    let first = stmt.get(pos)?.ident()?.to_string();
    let dotted = stmt.get(pos + 1).is_some_and(|t| t.is(TokenKind::Dot));
    if dotted {
        let second = stmt.get(pos + 2)?.ident()?.to_string();
        Some((Some(first), second, pos + 3))
    } else {
        Some((None, first, pos + 1))
    }
}

/// Accumulates one table while its definition fragments are classified.
struct TableBuilder {
    table: Table,
    primary_key: Vec<String>,
}

impl TableBuilder {
    fn new(schema: String, title: String) -> Self {
        Self {
            table: Table::new(schema, title),
            primary_key: Vec::new(),
        }
    }

    fn definition(&mut self, frag: &[Token]) {
        let first = &frag[0];
        let second_is = |word: &str| frag.get(1).is_some_and(|t| t.is_kw(word));

        if first.is_kw("PRIMARY") && second_is("KEY") {
            if let Some(cols) = first_group(frag) {
                self.primary_key.extend(column_list(cols));
            }
        } else if contains_pair(frag, "FOREIGN", "KEY") {
            self.foreign_keys(frag);
        } else if is_index_definition(frag) {
            self.index(frag);
        } else if first.is_kw("CHECK") || first.is_kw("CONSTRAINT") {
            tracing::debug!(target: "sqlsketch.parser", definition = %render(frag), "ignored constraint");
        } else {
            self.column(frag);
        }
    }

    /// `[CONSTRAINT name] FOREIGN KEY [ix] (col) REFERENCES [schema.]table (col) [ON ...]`,
    /// possibly several in one fragment.
    fn foreign_keys(&mut self, frag: &[Token]) {
        let mut i = 0;
        while i < frag.len() {
            if !(frag[i].is_kw("FOREIGN") && frag.get(i + 1).is_some_and(|t| t.is_kw("KEY"))) {
                i += 1;
                continue;
            }

            let constraint = (i >= 2 && frag[i - 2].is_kw("CONSTRAINT"))
                .then(|| frag[i - 1].ident())
                .flatten()
                .map(str::to_string);

            let Some(open) = next_paren(frag, i + 2) else {
                break;
            };
            let Some(close) = matching_paren(frag, open) else {
                break;
            };
            let columns = column_list(&frag[open + 1..close]);

            let mut j = close + 1;
            if !frag.get(j).is_some_and(|t| t.is_kw("REFERENCES")) {
                i = j;
                continue;
            }
            j += 1;
            let Some((ref_schema, ref_table, after)) = read_table_name(frag, j) else {
                i = j;
                continue;
            };
            let Some(ref_open) = next_paren(frag, after) else {
                break;
            };
            let Some(ref_close) = matching_paren(frag, ref_open) else {
                break;
            };
            let ref_columns = column_list(&frag[ref_open + 1..ref_close]);
            i = ref_close + 1;

            let ([column], [ref_column]) = (columns.as_slice(), ref_columns.as_slice()) else {
                tracing::warn!(
                    target: "sqlsketch.parser",
                    table = %self.table.title,
                    "multi-column foreign key ignored"
                );
                continue;
            };

            let schema = ref_schema.unwrap_or_else(|| self.table.schema.clone());
            let name = constraint.unwrap_or_else(|| format!("fk_{}_{}", self.table.title, column));

            let Some(field) = self.table.field_mut(column) else {
                tracing::warn!(
                    target: "sqlsketch.parser",
                    table = %self.table.title,
                    column = %column,
                    "foreign key on undefined column ignored"
                );
                continue;
            };
            field.is_fk = true;
            field.references = Some(Reference::new(schema, ref_table, ref_column.clone()));
            self.table.index.push(Index::foreign_key(name, column.clone()));
        }
    }

    /// `[UNIQUE] INDEX|KEY [name] (cols)` or `CONSTRAINT [name] UNIQUE [INDEX|KEY] [name] (cols)`.
    fn index(&mut self, frag: &[Token]) {
        let Some(open) = next_paren(frag, 0) else {
            return;
        };
        let Some(close) = matching_paren(frag, open) else {
            return;
        };
        let columns = column_list(&frag[open + 1..close]);
        if columns.is_empty() {
            return;
        }

        let head = &frag[..open];
        let unique = head.iter().any(|t| t.is_kw("UNIQUE"));
        let constraint_name = head
            .first()
            .filter(|t| t.is_kw("CONSTRAINT"))
            .and_then(|_| head.get(1))
            .filter(|t| !is_index_keyword(t))
            .and_then(Token::ident);
        let index_name = head
            .iter()
            .rev()
            .take_while(|t| !is_index_keyword(t))
            .filter(|t| !t.is_kw("USING") && !t.is_kw("BTREE") && !t.is_kw("HASH"))
            .find_map(Token::ident);
        let name = index_name
            .or(constraint_name)
            .map(str::to_string)
            .unwrap_or_else(|| columns[0].clone());

        if unique {
            for col in &columns {
                if let Some(field) = self.table.field_mut(col) {
                    field.constraints_mut().unique = true;
                }
            }
        }
        let kind = if unique { IndexKind::Unique } else { IndexKind::Index };
        self.table.index.push(Index::new(name, kind, columns));
    }

    /// `name type[(size)] [NOT NULL] [AUTO_INCREMENT] [DEFAULT v] [UNIQUE] [PRIMARY KEY] ...`
    fn column(&mut self, frag: &[Token]) {
        let Some(name) = frag[0].ident() else {
            return;
        };
        let Some(base) = frag.get(1).filter(|t| t.is(TokenKind::Word)) else {
            tracing::debug!(target: "sqlsketch.parser", definition = %render(frag), "column without type");
            return;
        };

        let mut ty = base.text.clone();
        let mut i = 2;
        if frag.get(2).is_some_and(|t| t.is(TokenKind::LParen)) {
            if let Some(close) = matching_paren(frag, 2) {
                ty.push_str(&render(&frag[2..=close]));
                i = close + 1;
            }
        }

        let mut field = Field::new(name, ty);
        while i < frag.len() {
            let tok = &frag[i];
            if tok.is_kw("NOT") && frag.get(i + 1).is_some_and(|t| t.is_kw("NULL")) {
                field.constraints_mut().not_null = true;
                i += 2;
            } else if tok.is_kw("AUTO_INCREMENT") {
                field.constraints_mut().auto_increment = true;
                i += 1;
            } else if tok.is_kw("DEFAULT") {
                let (value, next) = default_value(frag, i + 1);
                if let Some(value) = value {
                    field.constraints_mut().default = Some(value);
                }
                i = next;
            } else if tok.is_kw("UNIQUE") {
                field.constraints_mut().unique = true;
                i += 1;
            } else if tok.is_kw("PRIMARY") && frag.get(i + 1).is_some_and(|t| t.is_kw("KEY")) {
                self.primary_key.push(name.to_string());
                i += 2;
            } else if tok.is(TokenKind::LParen) {
                i = matching_paren(frag, i).map_or(frag.len(), |c| c + 1);
            } else {
                i += 1;
            }
        }
        self.table.fields.push(field);
    }

    fn finish(mut self) -> Table {
        let title = self.table.title.clone();
        for pk in &self.primary_key {
            if let Some(field) = self.table.field_mut(pk) {
                // Fields whose own reference targets this table's title are not marked.
                let self_reference = field.references.as_ref().is_some_and(|r| r.table == title);
                if !self_reference {
                    field.is_pk = true;
                }
            }
        }
        self.table
    }
}

/// Read a DEFAULT value starting at `i`; returns the value text and the next position.
fn default_value(frag: &[Token], i: usize) -> (Option<String>, usize) {
    let Some(tok) = frag.get(i) else {
        return (None, i);
    };
    match tok.kind {
        TokenKind::Str | TokenKind::Number => (Some(tok.text.clone()), i + 1),
        TokenKind::Op if tok.text == "-" || tok.text == "+" => {
            match frag.get(i + 1).filter(|t| t.is(TokenKind::Number)) {
                Some(num) => (Some(format!("{}{}", tok.text, num.text)), i + 2),
                None => (None, i + 1),
            }
        }
        TokenKind::LParen => match matching_paren(frag, i) {
            Some(close) => (Some(render(&frag[i..=close])), close + 1),
            None => (None, frag.len()),
        },
        TokenKind::Word => {
            // function-call defaults such as CURRENT_TIMESTAMP()
            if frag.get(i + 1).is_some_and(|t| t.is(TokenKind::LParen)) {
                if let Some(close) = matching_paren(frag, i + 1) {
                    return (Some(render(&frag[i..=close])), close + 1);
                }
            }
            (Some(tok.text.clone()), i + 1)
        }
        _ => (None, i + 1),
    }
}

fn is_index_keyword(tok: &Token) -> bool {
    ["INDEX", "KEY", "UNIQUE", "FULLTEXT", "SPATIAL", "CONSTRAINT"]
        .iter()
        .any(|kw| tok.is_kw(kw))
}

fn is_index_definition(frag: &[Token]) -> bool {
    let first = &frag[0];
    if ["INDEX", "KEY", "UNIQUE", "FULLTEXT", "SPATIAL"]
        .iter()
        .any(|kw| first.is_kw(kw))
    {
        return true;
    }
    // CONSTRAINT [name] UNIQUE ...
    first.is_kw("CONSTRAINT") && frag.iter().take(3).any(|t| t.is_kw("UNIQUE"))
}

fn contains_pair(frag: &[Token], a: &str, b: &str) -> bool {
    frag.windows(2).any(|w| w[0].is_kw(a) && w[1].is_kw(b))
}

fn next_paren(frag: &[Token], from: usize) -> Option<usize> {
    frag.iter()
        .enumerate()
        .skip(from)
        .find(|(_, t)| t.is(TokenKind::LParen))
        .map(|(i, _)| i)
}

/// Contents of the first parenthesised group in `frag`.
fn first_group(frag: &[Token]) -> Option<&[Token]> {
    let open = next_paren(frag, 0)?;
    let close = matching_paren(frag, open)?;
    Some(&frag[open + 1..close])
}

/// Column names of a `(a ASC, b(10), c)` list: the first identifier of each item.
fn column_list(group: &[Token]) -> Vec<String> {
    split_top_level(group, TokenKind::Comma)
        .into_iter()
        .filter_map(|item| item.first().and_then(Token::ident).map(str::to_string))
        .collect()
}
