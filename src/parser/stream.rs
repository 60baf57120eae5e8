//! Token stream utilities: clamped lookahead and the token-pattern matcher.
//!
//! The matcher applies a string of single-character classes against
//! consecutive tokens:
//!
//! | char | matches |
//! |------|---------|
//! | `w`  | word |
//! | ` `  | whitespace |
//! | `i`  | indent |
//! | `p`  | punctuation |
//! | `a`  | adornment |
//! | `o`  | other |
//! | `T`  | anything |
//! | `E`  | end of file, whitespace, or indent |
//! | `e`  | enumerator: a one-letter word, a digit run, or `#` |
//! | else | punctuation/adornment equal to the literal run, e.g. `--` |

use super::Parser;
use crate::tokenizer::{Token, TokenKind};

impl Parser<'_> {
    /// Token at `i`, clamped to the trailing `Eof`.
    pub(crate) fn at(&self, i: usize) -> &Token {
        match self.tok.get(i) {
            Some(t) => t,
            None => &self.tok[self.tok.len() - 1],
        }
    }

    pub(crate) fn cur(&self) -> &Token {
        self.at(self.idx)
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        self.at(self.idx + offset)
    }

    /// Token `offset` positions before the cursor, if the stream reaches
    /// back that far.
    pub(crate) fn back(&self, offset: usize) -> Option<&Token> {
        self.idx.checked_sub(offset).map(|i| &self.tok[i])
    }

    /// Column just past the current token's last character.
    pub(crate) fn tok_end(&self) -> usize {
        self.cur().end_col()
    }

    /// Index of the first token of the next line (one past the next
    /// indent), or of the trailing `Eof`.
    pub(crate) fn token_after_newline(&self) -> usize {
        self.token_after_newline_from(self.idx)
    }

    pub(crate) fn token_after_newline_from(&self, start: usize) -> usize {
        let mut i = start;
        loop {
            match self.at(i).kind {
                TokenKind::Eof => break,
                TokenKind::Indent => {
                    i += 1;
                    break;
                }
                _ => i += 1,
            }
        }
        i
    }

    pub(crate) fn match_pattern(&self, start: usize, pattern: &str) -> bool {
        let pat: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        let mut j = start;
        while i < pat.len() {
            let t = self.at(j);
            let matched = match pat[i] {
                'w' => {
                    i += 1;
                    t.kind == TokenKind::Word
                }
                ' ' => {
                    i += 1;
                    t.kind == TokenKind::Whitespace
                }
                'i' => {
                    i += 1;
                    t.kind == TokenKind::Indent
                }
                'p' => {
                    i += 1;
                    t.kind == TokenKind::Punct
                }
                'a' => {
                    i += 1;
                    t.kind == TokenKind::Adornment
                }
                'o' => {
                    i += 1;
                    t.kind == TokenKind::Other
                }
                'T' => {
                    i += 1;
                    true
                }
                'E' => {
                    i += 1;
                    matches!(
                        t.kind,
                        TokenKind::Eof | TokenKind::Whitespace | TokenKind::Indent
                    )
                }
                'e' => {
                    i += 1;
                    is_enumerator(t)
                }
                c => {
                    let mut run = 0;
                    while i < pat.len() && pat[i] == c {
                        run += 1;
                        i += 1;
                    }
                    matches!(t.kind, TokenKind::Punct | TokenKind::Adornment)
                        && t.text.chars().count() == run
                        && t.text.starts_with(c)
                }
            };
            if !matched {
                return false;
            }
            j += 1;
        }
        true
    }
}

fn is_enumerator(t: &Token) -> bool {
    if t.text == "#" {
        return true;
    }
    if t.kind != TokenKind::Word {
        return false;
    }
    let mut chars = t.text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => true,
        _ => !t.text.is_empty() && t.text.chars().all(|c| c.is_ascii_digit()),
    }
}
