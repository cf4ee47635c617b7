//! WHERE clause checking.
//!
//! Grammar (keywords case-insensitive):
//!
//! ```text
//! expr      := condition ((AND | OR) condition)*
//! condition := '(' expr ')' | column op value
//!            | column BETWEEN literal AND literal
//!            | column IN '(' literal (',' literal)* ')'
//!            | column LIKE string
//! column    := ident ('.' ident)*
//! op        := = | < | > | <= | >= | <> | !=
//! ```
//!
//! Literals are checked against the type of the column they are compared to.
//! `LIKE` patterns are only required to be string literals; their wildcards
//! are not checked against the column type.

use super::valid_field_data;
use crate::generate::SelectedField;
use crate::model::{Field, Table};
use crate::parser::lexer::{Token, TokenKind, tokenize};

/// Where column names are looked up.
#[derive(Debug, Clone, Copy)]
pub enum WhereScope<'a> {
    /// Columns of one table.
    Table(&'a Table),
    /// Selected columns, typed through the table catalogue.
    Selection {
        fields: &'a [SelectedField],
        tables: &'a [Table],
    },
}

impl<'a> WhereScope<'a> {
    fn resolve(&self, column: &str) -> Option<&'a Field> {
        match *self {
            Self::Table(table) => table.field(column),
            Self::Selection { fields, tables } => fields
                .iter()
                .filter(|f| f.column == column)
                .find_map(|f| {
                    tables
                        .iter()
                        .find(|t| t.is(&f.table))
                        .and_then(|t| t.field(column))
                }),
        }
    }
}

/// `None` and `""` are valid (no clause); a blank clause is not.
pub fn valid_where_clause(clause: Option<&str>, scope: &WhereScope<'_>) -> bool {
    let Some(clause) = clause.filter(|c| !c.is_empty()) else {
        return true;
    };
    if clause.trim().is_empty() {
        return false;
    }

    let tokens = tokenize(clause);
    let mut checker = Checker {
        tokens: &tokens,
        pos: 0,
        scope,
    };
    checker.expr() && checker.pos == tokens.len()
}

struct Checker<'t, 's> {
    tokens: &'t [Token],
    pos: usize,
    scope: &'s WhereScope<'s>,
}

impl<'t> Checker<'t, '_> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_kw(kw)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.is(kind)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> bool {
        if !self.condition() {
            return false;
        }
        while self.eat_kw("AND") || self.eat_kw("OR") {
            if !self.condition() {
                return false;
            }
        }
        true
    }

    fn condition(&mut self) -> bool {
        if self.eat(TokenKind::LParen) {
            return self.expr() && self.eat(TokenKind::RParen);
        }

        let Some(column) = self.column() else {
            return false;
        };
        let Some(field) = self.scope.resolve(&column) else {
            return false;
        };

        if self.eat_kw("BETWEEN") {
            return self.literal(field) && self.eat_kw("AND") && self.literal(field);
        }
        if self.eat_kw("IN") {
            if !self.eat(TokenKind::LParen) || !self.literal(field) {
                return false;
            }
            while self.eat(TokenKind::Comma) {
                if !self.literal(field) {
                    return false;
                }
            }
            return self.eat(TokenKind::RParen);
        }
        if self.eat_kw("LIKE") {
            return self.advance().is_some_and(|t| t.is(TokenKind::Str));
        }

        let comparison = self.advance().is_some_and(|t| {
            t.is(TokenKind::Op) && matches!(t.text.as_str(), "=" | "<" | ">" | "<=" | ">=" | "<>" | "!=")
        });
        comparison && self.value(field)
    }

    /// `a`, `t.a`, `` `s`.`t`.`a` ``; the last segment names the column.
    fn column(&mut self) -> Option<String> {
        let mut name = self.advance()?.ident()?.to_string();
        while self.eat(TokenKind::Dot) {
            name = self.advance()?.ident()?.to_string();
        }
        Some(name)
    }

    /// Right-hand side of a comparison: a literal, or another column in scope.
    fn value(&mut self, field: &Field) -> bool {
        let is_column = self
            .peek()
            .filter(|t| !t.is_kw("NULL") && !t.is_kw("TRUE") && !t.is_kw("FALSE"))
            .and_then(Token::ident)
            .is_some_and(|name| self.scope.resolve(name).is_some());
        if is_column {
            return self.column().is_some();
        }
        self.literal(field)
    }

    fn literal(&mut self, field: &Field) -> bool {
        let Some(tok) = self.advance() else {
            return false;
        };
        let text = match tok.kind {
            TokenKind::Str => {
                // the opening quote is always one ASCII byte
                let (quote, inner) = tok.text.split_at(1);
                inner.strip_suffix(quote).unwrap_or(inner).to_string()
            }
            TokenKind::Number => tok.text.clone(),
            TokenKind::Word => {
                if tok.is_kw("NULL") {
                    "NULL".to_string()
                } else {
                    tok.text.clone()
                }
            }
            TokenKind::Op if tok.text == "-" => {
                let Some(num) = self.advance().filter(|t| t.is(TokenKind::Number)) else {
                    return false;
                };
                format!("-{}", num.text)
            }
            _ => return false,
        };
        valid_field_data(Some(&text), Some(&field.ty), false)
    }
}
