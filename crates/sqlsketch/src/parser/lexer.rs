//! Tokenizer for MySQL-flavoured SQL text.
//!
//! Produces a flat token list; whitespace and comments (`-- `, `#`, `/* */`)
//! are dropped. Backtick identifiers are unescaped, string literals keep their
//! source text (quotes included) so they can be echoed back verbatim.

/// Token classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: keyword or unquoted identifier.
    Word,
    /// Backtick-quoted identifier.
    Quoted,
    /// Single- or double-quoted string literal.
    Str,
    /// Unsigned numeric literal.
    Number,
    LParen,
    RParen,
    Comma,
    Dot,
    Semicolon,
    /// Comparison or arithmetic operator (`=`, `<=`, `<>`, `!=`, `-`, ...).
    Op,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text (for `Quoted`: the unescaped name).
    pub text: String,
}

impl Token {
    /// Case-insensitive keyword check on bare words.
    pub fn is_kw(&self, kw: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(kw)
    }

    /// Identifier text for bare words and backtick identifiers.
    pub fn ident(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Word | TokenKind::Quoted => Some(&self.text),
            _ => None,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Text as it would be written back into SQL.
    pub fn sql_text(&self) -> String {
        match self.kind {
            TokenKind::Quoted => crate::ident::quote(&self.text),
            _ => self.text.clone(),
        }
    }

    fn is_atom(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Quoted | TokenKind::Str | TokenKind::Number
        )
    }
}

/// Tokenize `input`. Never fails: unterminated quotes run to end of input and
/// unknown characters become single-char operators.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        // Comments.
        if c == '#' || (c == '-' && bytes.get(start + 1) == Some(&b'-')) {
            while let Some(&(_, ch)) = chars.peek() {
                if ch == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }
        if c == '/' && bytes.get(start + 1) == Some(&b'*') {
            chars.next();
            chars.next();
            let mut prev = '\0';
            for (_, ch) in chars.by_ref() {
                if prev == '*' && ch == '/' {
                    break;
                }
                prev = ch;
            }
            continue;
        }

        let push = |tokens: &mut Vec<Token>, kind: TokenKind, text: String| {
            tokens.push(Token { kind, text });
        };

        match c {
            '(' | ')' | ',' | '.' | ';' => {
                chars.next();
                let kind = match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    _ => TokenKind::Semicolon,
                };
                push(&mut tokens, kind, c.to_string());
            }
            '`' => {
                chars.next();
                let mut name = String::new();
                while let Some((_, ch)) = chars.next() {
                    if ch == '`' {
                        // `` is an escaped backtick
                        if chars.peek().map(|&(_, n)| n) == Some('`') {
                            chars.next();
                            name.push('`');
                            continue;
                        }
                        break;
                    }
                    name.push(ch);
                }
                push(&mut tokens, TokenKind::Quoted, name);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut text = String::from(quote);
                while let Some((_, ch)) = chars.next() {
                    text.push(ch);
                    if ch == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            text.push(escaped);
                        }
                        continue;
                    }
                    if ch == quote {
                        if chars.peek().map(|&(_, n)| n) == Some(quote) {
                            chars.next();
                            text.push(quote);
                            continue;
                        }
                        break;
                    }
                }
                push(&mut tokens, TokenKind::Str, text);
            }
            '<' | '>' | '!' | '=' => {
                chars.next();
                let mut text = String::from(c);
                if let Some(&(_, next)) = chars.peek() {
                    let pair = matches!((c, next), ('<', '=') | ('>', '=') | ('<', '>') | ('!', '='));
                    if pair {
                        chars.next();
                        text.push(next);
                    }
                }
                push(&mut tokens, TokenKind::Op, text);
            }
            _ if c.is_ascii_digit() => {
                let mut text = String::new();
                let mut seen_dot = false;
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                    } else if ch == '.' && !seen_dot {
                        seen_dot = true;
                        text.push(ch);
                    } else {
                        break;
                    }
                    chars.next();
                }
                push(&mut tokens, TokenKind::Number, text);
            }
            _ if c == '_' || c == '$' || c.is_alphanumeric() => {
                let mut text = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch == '_' || ch == '$' || ch.is_alphanumeric() {
                        text.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                push(&mut tokens, TokenKind::Word, text);
            }
            _ => {
                chars.next();
                push(&mut tokens, TokenKind::Op, c.to_string());
            }
        }
    }

    tokens
}

/// Split a token stream into statements on `;` at parenthesis depth 0.
/// Empty statements are dropped.
pub fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon if depth == 0 => {
                if i > start {
                    out.push(&tokens[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        out.push(&tokens[start..]);
    }
    out
}

/// Split on `separator` tokens that sit at depth 0 of the given slice.
pub fn split_top_level(tokens: &[Token], separator: TokenKind) -> Vec<&[Token]> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            ref k if *k == separator && depth == 0 => {
                out.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&tokens[start..]);
    out.retain(|part| !part.is_empty());
    out
}

/// Index of the `)` matching the `(` at `open`, if balanced.
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Render tokens back into compact SQL text: atoms separated by a space,
/// punctuation attached.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if let Some(p) = prev {
            let spaced = (p.is_atom() && tok.is_atom())
                || p.kind == TokenKind::Op && p.text != "-"
                || tok.kind == TokenKind::Op;
            if spaced {
                out.push(' ');
            }
        }
        out.push_str(&tok.sql_text());
        prev = Some(tok);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_backtick_identifiers() {
        let toks = tokenize("`my schema`.`t``x`");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].text, "my schema");
        assert_eq!(toks[1].kind, TokenKind::Dot);
        assert_eq!(toks[2].text, "t`x");
    }

    #[test]
    fn keeps_string_literals_verbatim() {
        let toks = tokenize("DEFAULT 'it''s; fine'");
        assert_eq!(toks[1].kind, TokenKind::Str);
        assert_eq!(toks[1].text, "'it''s; fine'");
    }

    #[test]
    fn skips_comments() {
        let toks = tokenize("-- header\nSELECT /* inline */ 1 # tail");
        assert_eq!(kinds("-- x\n"), Vec::<TokenKind>::new());
        assert_eq!(toks.len(), 2);
        assert!(toks[0].is_kw("select"));
    }

    #[test]
    fn two_char_operators() {
        let toks = tokenize("a <= 1 AND b <> 2 AND c != 3");
        let ops: Vec<_> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Op)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["<=", "<>", "!="]);
    }

    #[test]
    fn splits_only_on_top_level_semicolons() {
        let toks = tokenize("CREATE TABLE a (x INT DEFAULT ';'); ; CREATE TABLE b (c ENUM('a;b'))");
        let stmts = split_statements(&toks);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[1].iter().any(|t| t.text == "b"));
    }

    #[test]
    fn nested_parens_do_not_split() {
        let toks = tokenize("a (b (c ; d)) ; e");
        assert_eq!(split_statements(&toks).len(), 2);
    }

    #[test]
    fn render_compacts_type_arguments() {
        let toks = tokenize("DECIMAL ( 10 , 2 )");
        assert_eq!(render(&toks), "DECIMAL(10,2)");
        assert_eq!(render(&tokenize("a = -1")), "a = -1");
    }

    #[test]
    fn matching_paren_handles_nesting() {
        let toks = tokenize("(a (b) c)");
        assert_eq!(matching_paren(&toks, 0), Some(toks.len() - 1));
        assert_eq!(matching_paren(&tokenize("(a"), 0), None);
    }
}
