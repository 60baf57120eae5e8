use serde::{Deserialize, Serialize};

/// Token classes produced by the lexer.
///
/// `Indent` is the only synthetic kind: it stands for a newline plus the
/// indentation of the following line. Runs of identical punctuation become
/// `Adornment`; short runs (three characters or fewer) are reclassified as
/// `Punct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Eof,
    Indent,
    Whitespace,
    Word,
    Adornment,
    Punct,
    Other,
}

/// A single lexed token.
///
/// `line` and `col` are 0-based; `col` is measured from the base indent so
/// that text embedded in comment prefixes aligns at column 0. `indent` is
/// only meaningful for `Indent` tokens, where it holds the column of the
/// next non-blank line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub indent: usize,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            indent: 0,
            line,
            col,
        }
    }

    /// Column of the last character of this token.
    pub fn end_col(&self) -> usize {
        self.col + self.text.chars().count().saturating_sub(1)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token({:?}, {:?}, {}:{})",
            self.kind, self.text, self.line, self.col
        )
    }
}
