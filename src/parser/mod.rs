//! Recursive indentation-driven parser.
//!
//! Parsing splits across four submodules that all extend the same
//! [`Parser`] frame:
//!
//! - [`stream`] — lookahead over the token stream and the token-pattern
//!   matcher used by block classification
//! - [`inline`] — inline markup with the reStructuredText boundary rules
//! - [`blocks`] — the block classifier and the per-element block parsers
//! - [`directives`] — everything introduced by `..`
//!
//! A frame is created per parse; nested frames (included files, table
//! cells) share one [`SharedState`], so substitution and reference tables
//! accumulate across files while the indent stack stays per frame.

pub mod blocks;
pub mod directives;
pub mod inline;
pub mod stream;

use std::path::PathBuf;

use crate::ast::{NodeKind, RstNode};
use crate::messages::{default_msg_handler, Diagnostic, MsgHandler, MsgKind, ParseError};
use crate::tokenizer::{Token, TokenKind};

/// Parser configuration flags, all off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Strip up to two leading `#` per line (documentation embedded in
    /// source comments).
    pub skip_pounds: bool,
    /// Recognize the smiley table in inline context.
    pub support_smileys: bool,
    /// Honor the `raw` directive. Disable for untrusted input.
    pub support_raw_directive: bool,
    /// Enable fenced ``` code blocks in inline context.
    pub support_markdown: bool,
}

/// File locator callback; `None` means not found.
pub type FindFileHandler = Box<dyn Fn(&str) -> Option<PathBuf>>;

/// The default locator accepts any name that exists as a file.
pub fn default_find_file() -> FindFileHandler {
    Box::new(|name| {
        let path = PathBuf::from(name);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    })
}

pub(crate) struct NamedNode {
    pub key: String,
    pub value: RstNode,
}

pub(crate) struct SubDef {
    pub key: String,
    pub value: Option<RstNode>,
}

/// State shared by every frame of one parse, include recursion included.
pub struct SharedState {
    pub options: Options,
    pub(crate) u_level: usize,
    pub(crate) o_level: usize,
    pub(crate) subs: Vec<SubDef>,
    pub(crate) refs: Vec<NamedNode>,
    pub(crate) underline_to_level: [usize; 256],
    pub(crate) overline_to_level: [usize; 256],
    pub(crate) msg_handler: MsgHandler,
    pub(crate) find_file: FindFileHandler,
    pub(crate) include_stack: Vec<PathBuf>,
}

impl SharedState {
    pub fn new(
        options: Options,
        find_file: Option<FindFileHandler>,
        msg_handler: Option<MsgHandler>,
    ) -> Self {
        Self {
            options,
            u_level: 0,
            o_level: 0,
            subs: Vec::new(),
            refs: Vec::new(),
            underline_to_level: [0; 256],
            overline_to_level: [0; 256],
            msg_handler: msg_handler.unwrap_or_else(default_msg_handler),
            find_file: find_file.unwrap_or_else(default_find_file),
            include_stack: Vec::new(),
        }
    }

    /// Level assigned to an underline character; the first occurrence of a
    /// character claims the next free level.
    pub(crate) fn underline_level(&mut self, c: char) -> usize {
        let i = c as usize & 0xff;
        if self.underline_to_level[i] == 0 {
            self.u_level += 1;
            self.underline_to_level[i] = self.u_level;
        }
        self.underline_to_level[i]
    }

    pub(crate) fn overline_level(&mut self, c: char) -> usize {
        let i = c as usize & 0xff;
        if self.overline_to_level[i] == 0 {
            self.o_level += 1;
            self.overline_to_level[i] = self.o_level;
        }
        self.overline_to_level[i]
    }
}

/// One parse frame: a token stream, a cursor, and the indent stack that
/// drives block nesting. `line`/`col` are the base position added to token
/// positions in diagnostics, non-zero for included files and table cells.
pub struct Parser<'s> {
    pub(crate) tok: Vec<Token>,
    pub(crate) idx: usize,
    pub(crate) indent_stack: Vec<usize>,
    pub(crate) filename: String,
    pub(crate) line: usize,
    pub(crate) col: usize,
    pub(crate) has_toc: bool,
    pub(crate) shared: &'s mut SharedState,
}

impl<'s> Parser<'s> {
    pub fn new(
        mut tok: Vec<Token>,
        filename: impl Into<String>,
        line: usize,
        col: usize,
        shared: &'s mut SharedState,
    ) -> Self {
        if tok.is_empty() {
            tok.push(Token::new(TokenKind::Eof, "", 0, 0));
        }
        Self {
            tok,
            idx: 0,
            indent_stack: vec![0],
            filename: filename.into(),
            line,
            col,
            has_toc: false,
            shared,
        }
    }

    pub fn has_toc(&self) -> bool {
        self.has_toc
    }

    pub(crate) fn curr_ind(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    pub(crate) fn push_ind(&mut self, ind: usize) {
        self.indent_stack.push(ind);
    }

    pub(crate) fn pop_ind(&mut self) {
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
        }
    }

    /// Report a diagnostic at the current token.
    pub(crate) fn msg(&mut self, kind: MsgKind, arg: &str) -> Result<(), ParseError> {
        let line = self.cur().line;
        let col = self.cur().col;
        self.msg_at(kind, arg, line, col)
    }

    /// Report a diagnostic at an explicit token position.
    pub(crate) fn msg_at(
        &mut self,
        kind: MsgKind,
        arg: &str,
        tok_line: usize,
        tok_col: usize,
    ) -> Result<(), ParseError> {
        let diag = Diagnostic {
            filename: self.filename.clone(),
            line: self.line + tok_line,
            col: self.col + tok_col,
            kind,
            arg: arg.to_string(),
        };
        (self.shared.msg_handler)(&diag)
    }

    /// Parse the whole token stream into a document fragment.
    pub fn parse_doc(&mut self) -> Result<RstNode, ParseError> {
        let result = self.parse_section_wrapper()?;
        if self.cur().kind != TokenKind::Eof {
            self.msg(MsgKind::GeneralParseError, "")?;
        }
        Ok(result)
    }

    pub(crate) fn parse_section_wrapper(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::Inner);
        self.parse_section(&mut result)?;
        while result.children.len() == 1 && result.children[0].kind == NodeKind::Inner {
            let Some(inner) = result.children.pop() else {
                break;
            };
            result = inner;
        }
        Ok(result)
    }
}
