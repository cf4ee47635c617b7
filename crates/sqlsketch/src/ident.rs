//! Backtick identifier rendering.
//!
//! Every identifier the generators emit goes through [`Ident`], which renders
//! each part wrapped in backticks and joins parts with `.`:
//!
//! ```
//! use sqlsketch::Ident;
//!
//! assert_eq!(Ident::table("shop", "orders").to_sql(), "`shop`.`orders`");
//! assert_eq!(Ident::new("odd`name").to_sql(), "`odd``name`");
//! ```

use std::fmt;

/// A dotted SQL identifier (schema, table, column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<String>,
}

impl Ident {
    /// Single-part identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    /// `schema`.`table`
    pub fn table(schema: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parts: vec![schema.into(), title.into()],
        }
    }

    /// `schema`.`table`.`column`
    pub fn column(
        schema: impl Into<String>,
        title: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            parts: vec![schema.into(), title.into(), column.into()],
        }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        // dots plus two backticks per part
        let cap = self.parts.iter().map(|p| p.len() + 3).sum::<usize>();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('`');
            for ch in part.chars() {
                if ch == '`' {
                    out.push('`');
                }
                out.push(ch);
            }
            out.push('`');
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Quote a single name: `` name `` → `` `name` ``.
pub fn quote(name: &str) -> String {
    Ident::new(name).to_sql()
}

/// Quote and comma-join a list of names.
pub fn quote_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| quote(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        assert_eq!(Ident::new("users").to_sql(), "`users`");
    }

    #[test]
    fn ident_table() {
        assert_eq!(Ident::table("app", "users").to_sql(), "`app`.`users`");
    }

    #[test]
    fn ident_column() {
        assert_eq!(
            Ident::column("app", "users", "id").to_sql(),
            "`app`.`users`.`id`"
        );
    }

    #[test]
    fn ident_keeps_spaces() {
        assert_eq!(
            Ident::table("New Schema", "t").to_sql(),
            "`New Schema`.`t`"
        );
    }

    #[test]
    fn ident_escapes_backtick() {
        assert_eq!(quote("a`b"), "`a``b`");
    }

    #[test]
    fn quote_list_joins() {
        assert_eq!(quote_list(&["a", "b"]), "`a`, `b`");
        assert_eq!(quote_list::<&str>(&[]), "");
    }
}
