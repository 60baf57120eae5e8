//! reStructuredText parser with Markdown inline extensions.
//!
//! The pipeline has three stages. The [`tokenizer`] turns source text into
//! a token stream with explicit indent tokens; the [`parser`] consumes the
//! stream with a recursive, indentation-driven block parser that calls an
//! inline recognizer for text runs and a directive subsystem for `..`
//! blocks; the [`resolver`] then walks the finished tree once to resolve
//! substitutions and hyperlink references, so forward references work.
//!
//! ```
//! use rstext::{parse_source, Options};
//!
//! let out = parse_source("*hello*", Options::default()).unwrap();
//! assert!(!out.has_toc);
//! ```
//!
//! Parsing is synchronous and pure apart from the two injectable
//! callbacks: a file locator used by the `include`, `code-block` and `raw`
//! directives, and a diagnostic sink that decides whether an error unwinds
//! the parse.

pub mod ast;
pub mod messages;
pub mod parser;
pub mod resolver;
pub mod tokenizer;

pub use ast::{eq_ignore_style, NodeKind, RstNode};
pub use messages::{
    default_msg_handler, Diagnostic, MsgHandler, MsgKind, ParseError, Severity,
};
pub use parser::{default_find_file, FindFileHandler, Options, Parser, SharedState};
pub use resolver::rstnode_to_refname;
pub use tokenizer::{tokenize, Token, TokenKind};

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub doc: RstNode,
    /// A `contents` directive was seen.
    pub has_toc: bool,
}

/// Parse a document. `line` and `col` shift reported positions, for text
/// that does not start at the top of its file. `None` callbacks select the
/// defaults: a locator that accepts existing files and a sink that prints
/// to stderr and aborts on errors.
pub fn parse(
    text: &str,
    filename: &str,
    line: usize,
    col: usize,
    options: Options,
    find_file: Option<FindFileHandler>,
    msg_handler: Option<MsgHandler>,
) -> Result<ParseOutput, ParseError> {
    let mut shared = SharedState::new(options, find_file, msg_handler);
    let mut tokens = Vec::new();
    let base = tokenize(text, options.skip_pounds, &mut tokens);
    let mut p = Parser::new(tokens, filename, line, col + base, &mut shared);
    let doc = p.parse_doc()?;
    let doc = p.resolve_subs(doc)?;
    Ok(ParseOutput {
        doc,
        has_toc: p.has_toc(),
    })
}

/// [`parse`] with default position, filename, and callbacks.
pub fn parse_source(text: &str, options: Options) -> Result<ParseOutput, ParseError> {
    parse(text, "", 0, 0, options, None, None)
}
