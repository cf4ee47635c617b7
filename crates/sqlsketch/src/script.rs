//! Accumulates generated statements into one script.
//!
//! Consecutive SELECTs can be combined with [`Script::union`]; the previous
//! statement loses its `;` and a `UNION` line follows it. If anything other
//! than a SELECT arrives after a dangling `UNION`, the marker is dropped and
//! the previous statement is terminated again.

use crate::generate::StatementKind;

const UNION: &str = "UNION";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generated statement of the given kind. Empty statements (a
    /// no-op ALTER) are ignored.
    pub fn push(&mut self, kind: StatementKind, sql: impl Into<String>) {
        let sql = sql.into();
        if sql.is_empty() {
            return;
        }
        if kind != StatementKind::Select && self.has_dangling_union() {
            self.lines.pop();
            if let Some(prev) = self.lines.last_mut() {
                prev.push(';');
            }
        }
        self.lines.push(sql);
    }

    /// Mark the last statement as the left side of a UNION. Returns `false`
    /// (and does nothing) when the last statement is missing or already open.
    pub fn union(&mut self) -> bool {
        if self.has_dangling_union() {
            return false;
        }
        let Some(last) = self.lines.last_mut() else {
            return false;
        };
        if !last.ends_with(';') {
            return false;
        }
        last.pop();
        self.lines.push(UNION.to_string());
        true
    }

    pub fn has_dangling_union(&self) -> bool {
        self.lines.last().is_some_and(|l| l == UNION)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The script text, one statement (or `UNION`) per line.
    pub fn to_sql(&self) -> String {
        self.lines.join("\n")
    }
}
