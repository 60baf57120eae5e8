//! Lexical analysis.
//!
//! This module turns raw source text into an ordered stream of [`Token`]s
//! with semantic whitespace. The stream always ends in exactly one `Eof`
//! token, and indentation is explicit: each newline produces an `Indent`
//! token carrying the column of the next non-blank line, which is what lets
//! the block parser drive itself from an indent stack instead of looking at
//! raw text.
//!
//! Token classes:
//!
//! - `Word` — runs of alphanumerics (and any non-ASCII character)
//! - `Whitespace` — runs of blanks not followed by a newline
//! - `Indent` — a newline plus the following line's indentation
//! - `Adornment` — runs of one repeated punctuation character
//! - `Punct` — adornment runs of length three or shorter
//! - `Other` — any single character that fits nothing else
//! - `Eof` — end of input

pub mod lexer;
pub mod tokens;


pub use lexer::Lexer;
pub use tokens::{Token, TokenKind};

/// Tokenize `text`, appending onto `tokens` until an `Eof` token has been
/// produced. Returns the number of source columns consumed before
/// tokenization began (non-zero only in comment-leader mode), which callers
/// use to shift the base column of included files.
pub fn tokenize(text: &str, skip_pounds: bool, tokens: &mut Vec<Token>) -> usize {
    let mut lexer = Lexer::new(text, skip_pounds);
    let consumed = lexer.skip_prefix();
    let first = tokens.len();
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    if tokens[first].kind == TokenKind::Whitespace {
        tokens[first].indent = tokens[first].text.chars().count();
        tokens[first].kind = TokenKind::Indent;
    }
    consumed
}
