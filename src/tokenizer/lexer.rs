//! Character-level lexer.
//!
//! Converts source text into the token stream consumed by the parser. The
//! lexer is whitespace-sensitive: every newline yields exactly one `Indent`
//! token whose payload is the indentation of the next non-blank line, and a
//! whitespace run directly in front of a newline is folded into that
//! `Indent`. An optional comment-leader mode strips up to two `#` characters
//! plus leading spaces per line, so documentation embedded in source
//! comments lexes as if it started at column 0.

use super::tokens::{Token, TokenKind};

/// Characters that form `Word` tokens: ASCII alphanumerics plus every
/// non-ASCII character.
fn is_sym_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c as u32 >= 0x80
}

/// ASCII punctuation, the alphabet of `Punct` and `Adornment` tokens.
fn is_punct_char(c: char) -> bool {
    matches!(c, '!'..='/' | ':'..='@' | '['..='`' | '{'..='~')
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    col: usize,
    base_indent: usize,
    skip_pounds: bool,
}

impl Lexer {
    pub fn new(input: &str, skip_pounds: bool) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 0,
            col: 0,
            base_indent: 0,
            skip_pounds,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Skip the UTF-8 BOM and, in comment-leader mode, the `##`-plus-spaces
    /// prefix of the first line. Returns the number of columns consumed; the
    /// space count becomes the base indent subtracted from every token.
    pub fn skip_prefix(&mut self) -> usize {
        if self.peek() == Some('\u{feff}') {
            self.position += 1;
        }
        let mut consumed = 0;
        if self.skip_pounds {
            for _ in 0..2 {
                if self.peek() == Some('#') {
                    self.position += 1;
                    consumed += 1;
                }
            }
            while self.peek() == Some(' ') {
                self.position += 1;
                self.base_indent += 1;
                consumed += 1;
            }
        }
        consumed
    }

    pub fn next_token(&mut self) -> Token {
        match self.peek() {
            None | Some('\0') => Token::new(
                TokenKind::Eof,
                "",
                self.line,
                self.col.saturating_sub(self.base_indent),
            ),
            Some('\r') | Some('\n') => self.read_indent(),
            Some(' ') | Some('\t') | Some('\x0b') | Some('\x0c') => self.read_whitespace(),
            Some(c) if is_sym_char(c) => self.read_word(),
            Some(c) if is_punct_char(c) => self.read_adornment(),
            Some(_) => self.read_other(),
        }
    }

    fn start_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, "", self.line, self.col.saturating_sub(self.base_indent))
    }

    fn read_word(&mut self) -> Token {
        let mut tok = self.start_token(TokenKind::Word);
        while let Some(c) = self.peek() {
            if !is_sym_char(c) {
                break;
            }
            tok.text.push(c);
            self.position += 1;
            self.col += 1;
        }
        tok
    }

    fn read_whitespace(&mut self) -> Token {
        let mut tok = self.start_token(TokenKind::Whitespace);
        if let Some(c) = self.peek() {
            tok.text.push(c);
            self.position += 1;
            self.col += 1;
        }
        while let Some(c) = self.peek() {
            if c != ' ' && c != '\t' {
                break;
            }
            tok.text.push(c);
            self.position += 1;
            self.col += 1;
        }
        // whitespace directly before a newline belongs to the indent
        if matches!(self.peek(), Some('\r') | Some('\n')) {
            return self.read_indent();
        }
        tok
    }

    fn read_adornment(&mut self) -> Token {
        let mut tok = self.start_token(TokenKind::Adornment);
        let first = self.peek();
        while let Some(c) = self.peek() {
            if Some(c) != first {
                break;
            }
            tok.text.push(c);
            self.position += 1;
            self.col += 1;
        }
        if tok.text.chars().count() <= 3 {
            tok.kind = TokenKind::Punct;
        }
        tok
    }

    fn read_other(&mut self) -> Token {
        let mut tok = self.start_token(TokenKind::Other);
        if let Some(c) = self.peek() {
            tok.text.push(c);
            self.position += 1;
            self.col += 1;
        }
        tok
    }

    /// Consume one newline plus the indentation of the line it opens. When
    /// that line is blank the indentation of the next non-blank line is
    /// reported instead, without consuming past the blank line's newline, so
    /// every source newline still yields its own token.
    fn read_indent(&mut self) -> Token {
        self.consume_newline();
        let mut width = self.scan_indent_width();
        match self.peek() {
            None | Some('\0') => width = 0,
            Some('\r') | Some('\n') => width = self.lookahead_indent(self.position),
            _ => {}
        }
        self.line += 1;
        self.col = width;
        let ival = width.saturating_sub(self.base_indent);
        let mut tok = Token::new(TokenKind::Indent, format!("\n{}", " ".repeat(ival)), self.line, 0);
        tok.indent = ival;
        tok
    }

    fn consume_newline(&mut self) {
        if self.peek() == Some('\r') {
            self.position += 1;
            if self.peek() == Some('\n') {
                self.position += 1;
            }
        } else if self.peek() == Some('\n') {
            self.position += 1;
        }
    }

    fn scan_indent_width(&mut self) -> usize {
        if self.skip_pounds {
            for _ in 0..2 {
                if self.peek() == Some('#') {
                    self.position += 1;
                }
            }
        }
        let mut width = 0;
        loop {
            match self.peek() {
                Some(' ') | Some('\x0b') | Some('\x0c') => {
                    self.position += 1;
                    width += 1;
                }
                Some('\t') => {
                    self.position += 1;
                    width = width - width % 8 + 8;
                }
                _ => break,
            }
        }
        width
    }

    /// Indentation of the next non-blank line starting at `start` (which
    /// points at a newline), computed without moving the lexer.
    fn lookahead_indent(&self, start: usize) -> usize {
        let mut pos = start;
        if self.input.get(pos) == Some(&'\r') {
            pos += 1;
            if self.input.get(pos) == Some(&'\n') {
                pos += 1;
            }
        } else if self.input.get(pos) == Some(&'\n') {
            pos += 1;
        }
        if self.skip_pounds {
            for _ in 0..2 {
                if self.input.get(pos) == Some(&'#') {
                    pos += 1;
                }
            }
        }
        let mut width = 0;
        loop {
            match self.input.get(pos) {
                Some(' ') | Some('\x0b') | Some('\x0c') => {
                    pos += 1;
                    width += 1;
                }
                Some('\t') => {
                    pos += 1;
                    width = width - width % 8 + 8;
                }
                _ => break,
            }
        }
        match self.input.get(pos) {
            None | Some('\0') => 0,
            Some('\r') | Some('\n') => self.lookahead_indent(pos),
            _ => width,
        }
    }
}
