//! Built-in SQL canonicalizer.
//!
//! Comments are dropped, bare words upper-cased and whitespace rebuilt from
//! the token stream, so keyword case, comments and layout never register as
//! changes. String literals and quoted identifiers are kept verbatim.

use std::path::Path;

use sdt_lang_api::{LangError, LangResult, LanguageProfile, TreeSource};

/// Registry id and `[commands.sql]` key.
pub const ID: &str = "sql";
/// Display name.
pub const LABEL: &str = "SQL";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[
    ".sql", ".pls", ".bdy", ".ddl", ".fnc", ".pck", ".pkb", ".pks", ".pgsql", ".plb", ".plsql",
    ".prc", ".spc", ".tpb", ".tps", ".trg", ".vw",
];

/// Keywords that start a new output line.
const CLAUSES: &[&str] = &[
    "FROM", "WHERE", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "EXCEPT",
    "INTERSECT", "VALUES", "SET", "JOIN", "LEFT", "RIGHT", "INNER", "CROSS", "FULL", "RETURNING",
];

/// Words that fold a following `JOIN` onto their own line.
const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "OUTER", "CROSS", "FULL", "NATURAL"];

/// SQL is compared by canonical rendering; nothing needs stripping.
#[must_use]
pub const fn profile() -> LanguageProfile {
    LanguageProfile::canonical()
}

/// In-process SQL canonicalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlCanonical;

impl TreeSource for SqlCanonical {
    fn describe(&self) -> String {
        "built-in SQL canonicalizer".into()
    }

    fn dump(&self, path: &Path) -> LangResult<Vec<u8>> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| LangError::message(format!("failed to read {}: {err}", path.display())))?;
        Ok(canonicalize(&text).into_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Keyword or bare identifier, already upper-cased.
    Word(String),
    /// Literal, quoted identifier, number or operator kept as written.
    Verbatim(String),
    Punct(u8),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Word(text) | Self::Verbatim(text) => text.clone(),
            Self::Punct(byte) => char::from(*byte).to_string(),
        }
    }

    fn is_punct(&self, byte: u8) -> bool {
        matches!(self, Self::Punct(b) if *b == byte)
    }
}

struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            src: text.as_bytes(),
            pos: 0,
        }
    }

    fn tokenize(text: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(text);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();
        let ch = self.peek_at(0)?;
        let start = self.pos;
        let token = match ch {
            b'\'' => {
                self.skip_quoted(b'\'');
                Token::Verbatim(self.slice(start))
            }
            b'"' => {
                self.skip_quoted(b'"');
                Token::Verbatim(self.slice(start))
            }
            b'`' => {
                self.skip_quoted(b'`');
                Token::Verbatim(self.slice(start))
            }
            b'[' => {
                self.skip_quoted(b']');
                Token::Verbatim(self.slice(start))
            }
            b'0'..=b'9' => {
                self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'.');
                Token::Verbatim(self.slice(start))
            }
            b if is_word_byte(b) => {
                self.skip_while(is_word_byte);
                Token::Word(self.slice(start).to_uppercase())
            }
            b if is_operator_byte(b) => {
                self.skip_while(is_operator_byte);
                Token::Verbatim(self.slice(start))
            }
            b if b.is_ascii() => {
                self.pos += 1;
                Token::Punct(b)
            }
            _ => {
                self.pos += 1;
                while self.pos < self.src.len() && !self.text.is_char_boundary(self.pos) {
                    self.pos += 1;
                }
                Token::Verbatim(self.slice(start))
            }
        };
        Some(token)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match (self.peek_at(0), self.peek_at(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.pos += 1,
                (Some(b'-'), Some(b'-')) => self.skip_while(|b| b != b'\n'),
                (Some(b'/'), Some(b'*')) => {
                    self.pos += 2;
                    while self.pos < self.src.len()
                        && !(self.peek_at(0) == Some(b'*') && self.peek_at(1) == Some(b'/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.src.len());
                }
                _ => return,
            }
        }
    }

    /// Advance past a quoted run closed by `close`; a doubled closer is an escape.
    fn skip_quoted(&mut self, close: u8) {
        self.pos += 1;
        while let Some(b) = self.peek_at(0) {
            self.pos += 1;
            if b == close {
                if self.peek_at(0) == Some(close) && close != b']' {
                    self.pos += 1;
                } else {
                    return;
                }
            }
        }
    }

    fn skip_while(&mut self, keep: impl Fn(u8) -> bool) {
        while self.peek_at(0).is_some_and(&keep) {
            self.pos += 1;
        }
    }

    fn slice(&self, start: usize) -> String {
        self.text.get(start..self.pos).unwrap_or_default().to_owned()
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

fn is_operator_byte(b: u8) -> bool {
    matches!(
        b,
        b'<' | b'>' | b'=' | b'!' | b'|' | b'&' | b'+' | b'-' | b'*' | b'/' | b'%' | b'^' | b'~' | b':'
    )
}

/// Rebuild `text` as one canonical line per clause.
#[must_use]
pub fn canonicalize(text: &str) -> String {
    let tokens = Lexer::tokenize(text);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous: Option<&Token> = None;

    for token in &tokens {
        if starts_clause(token, previous) && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        let glued = current.is_empty()
            || token.is_punct(b',')
            || token.is_punct(b')')
            || token.is_punct(b'.')
            || token.is_punct(b';')
            || previous.is_some_and(|prev| prev.is_punct(b'(') || prev.is_punct(b'.'));
        if !glued {
            current.push(' ');
        }
        current.push_str(&token.text());

        if token.is_punct(b';') {
            lines.push(std::mem::take(&mut current));
            previous = None;
        } else {
            previous = Some(token);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn starts_clause(token: &Token, previous: Option<&Token>) -> bool {
    let Token::Word(word) = token else {
        return false;
    };
    if !CLAUSES.contains(&word.as_str()) {
        return false;
    }
    let after_modifier = matches!(previous, Some(Token::Word(prev)) if JOIN_MODIFIERS.contains(&prev.as_str()));
    !(word == "JOIN" && after_modifier)
}
