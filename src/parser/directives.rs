//! Everything introduced by `..` at the start of a line: named directives,
//! hyperlink targets, substitution definitions, footnote targets, and
//! comments.
//!
//! A named directive has up to three pieces: an argument (parsed as a file
//! name, a single word, or inline content depending on the directive), an
//! option field list, and an indented body handed to either the literal
//! block parser or the full section parser. The `include` directive opens a
//! nested parser frame over the included file's tokens; the frames share
//! one state object, so substitutions and targets defined in included files
//! stay visible, and the in-progress include stack breaks inclusion cycles.

use std::fs;

use super::Parser;
use crate::ast::{eq_ignore_style, NodeKind, RstNode};
use crate::messages::{MsgKind, ParseError};
use crate::tokenizer::{tokenize, TokenKind};

/// Languages the code directives accept without complaint; anything else
/// draws an unsupported-language warning but is kept as written.
const KNOWN_LANGUAGES: [&str; 16] = [
    "nim", "nimrod", "c", "cpp", "csharp", "java", "javascript", "python", "ruby", "rust", "sh",
    "bash", "xml", "html", "json", "yaml",
];

const CODE_FIELDS: &[&str] = &["file", "default-language", "linenos", "number-lines"];
const IMAGE_FIELDS: &[&str] = &["scale", "width", "height", "alt", "align", "target"];
const RAW_FIELDS: &[&str] = &["file"];
const INCLUDE_FIELDS: &[&str] = &[
    "literal",
    "encoding",
    "start-line",
    "end-line",
    "start-after",
    "end-before",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirArgKind {
    None,
    Inline,
    Word,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirBody {
    None,
    LiteralBlock,
    Section,
}

/// The parsed pieces of a directive before a handler assembles its node.
struct DirParts {
    arg: Option<RstNode>,
    options: Option<RstNode>,
    body: Option<RstNode>,
}

impl DirParts {
    fn into_node(self, kind: NodeKind) -> RstNode {
        let mut n = RstNode::new(kind);
        if let Some(a) = self.arg {
            n.add(a);
        }
        if let Some(o) = self.options {
            n.add(o);
        }
        if let Some(b) = self.body {
            n.add(b);
        }
        n
    }

    fn arg_text(&self) -> String {
        self.arg
            .as_ref()
            .map(|a| a.concat_text().trim().to_string())
            .unwrap_or_default()
    }

    fn field_value(&self, name: &str) -> Option<String> {
        self.options.as_ref().and_then(|o| o.field_value(name))
    }
}

impl Parser<'_> {
    fn ind_follows(&self) -> bool {
        self.cur().kind == TokenKind::Indent && self.cur().indent > self.curr_ind()
    }

    /// Directive name in front of `::`, or empty with the cursor restored.
    fn get_directive(&mut self) -> String {
        if self.cur().kind != TokenKind::Whitespace || self.peek(1).kind != TokenKind::Word {
            return String::new();
        }
        let save = self.idx;
        self.idx += 1;
        let mut result = self.cur().text.clone();
        self.idx += 1;
        while matches!(
            self.cur().kind,
            TokenKind::Word | TokenKind::Punct | TokenKind::Adornment | TokenKind::Other
        ) {
            if self.cur().text == "::" {
                break;
            }
            result.push_str(&self.cur().text);
            self.idx += 1;
        }
        if self.cur().kind == TokenKind::Whitespace {
            self.idx += 1;
        }
        if self.cur().text == "::" {
            self.idx += 1;
            if self.cur().kind == TokenKind::Whitespace {
                self.idx += 1;
            }
            result
        } else {
            self.idx = save;
            String::new()
        }
    }

    fn parse_directive(
        &mut self,
        arg_kind: DirArgKind,
        has_options: bool,
        body: DirBody,
    ) -> Result<DirParts, ParseError> {
        let mut arg = None;
        match arg_kind {
            DirArgKind::File => {
                let mut a = RstNode::new(NodeKind::DirArg);
                while matches!(
                    self.cur().kind,
                    TokenKind::Word | TokenKind::Punct | TokenKind::Adornment | TokenKind::Other
                ) {
                    a.add(self.new_leaf());
                    self.idx += 1;
                }
                arg = Some(a);
            }
            DirArgKind::Word => {
                while self.cur().kind == TokenKind::Whitespace {
                    self.idx += 1;
                }
                if self.cur().kind == TokenKind::Word {
                    let mut a = RstNode::new(NodeKind::DirArg);
                    a.add(self.new_leaf());
                    self.idx += 1;
                    arg = Some(a);
                }
            }
            DirArgKind::Inline => {
                let mut a = RstNode::new(NodeKind::DirArg);
                self.parse_line(&mut a)?;
                arg = Some(a);
            }
            DirArgKind::None => {}
        }
        let mut options = None;
        if has_options
            && self.cur().kind == TokenKind::Indent
            && self.cur().indent >= 3
            && self.peek(1).text == ":"
        {
            options = self.parse_fields()?;
        }
        let body = match body {
            DirBody::None => None,
            _ if !self.ind_follows() => None,
            DirBody::LiteralBlock => {
                let ind = self.cur().indent;
                self.push_ind(ind);
                let block = self.parse_literal_block()?;
                self.pop_ind();
                Some(block)
            }
            DirBody::Section => {
                let ind = self.cur().indent;
                self.push_ind(ind);
                let section = self.parse_section_wrapper()?;
                self.pop_ind();
                Some(section)
            }
        };
        Ok(DirParts { arg, options, body })
    }

    /// Warn about option fields a directive does not know; the fields stay
    /// in the tree either way.
    fn check_fields(&mut self, parts: &DirParts, known: &[&str]) -> Result<(), ParseError> {
        let names: Vec<String> = match parts.options.as_ref() {
            Some(options) => options
                .children
                .iter()
                .filter(|f| f.kind == NodeKind::Field && !f.children.is_empty())
                .map(|f| f.children[0].concat_text())
                .collect(),
            None => return Ok(()),
        };
        for name in names {
            if !known.iter().any(|k| eq_ignore_style(k, &name)) {
                self.msg(MsgKind::UnsupportedField, &name)?;
            }
        }
        Ok(())
    }

    fn dir_include(&mut self) -> Result<Option<RstNode>, ParseError> {
        let parts = self.parse_directive(DirArgKind::File, true, DirBody::None)?;
        self.check_fields(&parts, INCLUDE_FIELDS)?;
        let filename = parts.arg_text();
        let path = match (self.shared.find_file)(&filename) {
            Some(path) => path,
            None => {
                self.msg(MsgKind::CannotOpenFile, &filename)?;
                return Ok(None);
            }
        };
        if self.shared.include_stack.contains(&path) {
            self.msg(MsgKind::RecursiveInclude, &filename)?;
            return Ok(None);
        }
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => {
                self.msg(MsgKind::CannotOpenFile, &filename)?;
                return Ok(None);
            }
        };
        if parts.field_value("literal").is_some() {
            let mut block = RstNode::new(NodeKind::LiteralBlock);
            block.add(RstNode::leaf(contents));
            Ok(Some(block))
        } else {
            log::debug!("including '{}'", filename);
            self.shared.include_stack.push(path);
            let mut tokens = Vec::new();
            tokenize(&contents, false, &mut tokens);
            let doc = {
                let mut q = Parser::new(tokens, filename.clone(), 0, 0, &mut *self.shared);
                q.parse_doc()
            };
            self.shared.include_stack.pop();
            Ok(Some(doc?))
        }
    }

    fn dir_image(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::File, true, DirBody::None)?;
        self.check_fields(&parts, IMAGE_FIELDS)?;
        Ok(parts.into_node(NodeKind::Image))
    }

    fn dir_figure(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::File, true, DirBody::Section)?;
        self.check_fields(&parts, IMAGE_FIELDS)?;
        Ok(parts.into_node(NodeKind::Figure))
    }

    fn dir_title(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::Inline, false, DirBody::None)?;
        Ok(parts.into_node(NodeKind::Title))
    }

    fn dir_container(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::Inline, false, DirBody::Section)?;
        Ok(parts.into_node(NodeKind::Container))
    }

    fn dir_contents(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::Inline, false, DirBody::None)?;
        Ok(parts.into_node(NodeKind::Contents))
    }

    fn dir_index(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::None, false, DirBody::Section)?;
        Ok(parts.into_node(NodeKind::Index))
    }

    fn dir_code_block(&mut self, extended: bool) -> Result<RstNode, ParseError> {
        let mut parts = self.parse_directive(DirArgKind::Word, true, DirBody::LiteralBlock)?;
        let language = parts.arg_text();
        if !language.is_empty()
            && !KNOWN_LANGUAGES.iter().any(|k| eq_ignore_style(k, &language))
        {
            self.msg(MsgKind::UnsupportedLanguage, &language)?;
        }
        self.check_fields(&parts, CODE_FIELDS)?;
        if extended {
            if let Some(file) = parts.field_value("file") {
                let file = file.trim().to_string();
                if !file.is_empty() {
                    match (self.shared.find_file)(&file).and_then(|p| fs::read_to_string(p).ok()) {
                        Some(contents) => {
                            let mut block = RstNode::new(NodeKind::LiteralBlock);
                            block.add(RstNode::leaf(contents));
                            parts.body = Some(block);
                        }
                        None => self.msg(MsgKind::CannotOpenFile, &file)?,
                    }
                }
            }
            let missing = parts
                .options
                .as_ref()
                .map(|o| o.children.is_empty())
                .unwrap_or(true);
            if missing {
                let mut name = RstNode::new(NodeKind::FieldName);
                name.add(RstNode::leaf("default-language"));
                let mut body = RstNode::new(NodeKind::FieldBody);
                body.add(RstNode::leaf("Nimrod"));
                let mut field = RstNode::new(NodeKind::Field);
                field.add(name);
                field.add(body);
                let mut list = RstNode::new(NodeKind::FieldList);
                list.add(field);
                parts.options = Some(list);
            }
        }
        Ok(parts.into_node(NodeKind::CodeBlock))
    }

    fn dir_raw(&mut self) -> Result<RstNode, ParseError> {
        let parts = self.parse_directive(DirArgKind::Word, true, DirBody::None)?;
        self.check_fields(&parts, RAW_FIELDS)?;
        let arg = parts.arg_text().to_ascii_lowercase();
        let kind = match arg.as_str() {
            "" => NodeKind::Raw,
            "html" => NodeKind::RawHtml,
            "latex" => NodeKind::RawLatex,
            other => {
                self.msg(MsgKind::InvalidDirective, other)?;
                NodeKind::Raw
            }
        };
        if let Some(file) = parts.field_value("file") {
            let file = file.trim().to_string();
            match (self.shared.find_file)(&file).and_then(|p| fs::read_to_string(p).ok()) {
                Some(contents) => {
                    let mut n = RstNode::new(kind);
                    n.add(RstNode::leaf(contents));
                    return Ok(n);
                }
                None => self.msg(MsgKind::CannotOpenFile, &file)?,
            }
            return Ok(parts.into_node(kind));
        }
        let mut parts = parts;
        if self.ind_follows() {
            let ind = self.cur().indent;
            self.push_ind(ind);
            parts.body = Some(if kind == NodeKind::Raw {
                self.parse_section_wrapper()?
            } else {
                self.parse_literal_block()?
            });
            self.pop_ind();
        }
        Ok(parts.into_node(kind))
    }

    /// Inline reference name up to a closing token, e.g. the `name` of
    /// `.. _name:` or `.. |name|`.
    fn get_reference_name(&mut self, end_tok: &str) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::Inner);
        loop {
            match self.cur().kind {
                TokenKind::Word | TokenKind::Other | TokenKind::Whitespace => {
                    result.add(self.new_leaf());
                    self.idx += 1;
                }
                TokenKind::Punct => {
                    if self.cur().text == end_tok {
                        self.idx += 1;
                        break;
                    }
                    result.add(self.new_leaf());
                    self.idx += 1;
                }
                _ => {
                    self.msg(MsgKind::Expected, end_tok)?;
                    break;
                }
            }
        }
        Ok(result)
    }

    fn until_eol(&mut self) -> RstNode {
        let mut result = RstNode::new(NodeKind::Inner);
        while !matches!(self.cur().kind, TokenKind::Indent | TokenKind::Eof) {
            result.add(self.new_leaf());
            self.idx += 1;
        }
        result
    }

    pub(crate) fn set_ref(&mut self, key: String, value: RstNode) -> Result<(), ParseError> {
        if let Some(i) = self.shared.refs.iter().position(|r| r.key == key) {
            let redefined = self.shared.refs[i].value.concat_text() != value.concat_text();
            if redefined {
                let key = key.clone();
                self.msg(MsgKind::RedefinitionOfLabel, &key)?;
            }
            self.shared.refs[i].value = value;
            return Ok(());
        }
        self.shared.refs.push(super::NamedNode { key, value });
        Ok(())
    }

    fn set_sub(&mut self, key: String, value: Option<RstNode>) {
        if let Some(i) = self.shared.subs.iter().position(|s| s.key == key) {
            self.shared.subs[i].value = value;
            return;
        }
        self.shared.subs.push(super::SubDef { key, value });
    }

    /// Consume a comment: everything indented deeper than the `..` marker.
    fn parse_comment(&mut self) {
        match self.cur().kind {
            TokenKind::Indent | TokenKind::Eof => {
                if self.cur().kind == TokenKind::Indent && self.peek(1).kind == TokenKind::Indent {
                    self.idx += 1; // empty comment
                } else {
                    let indent = self.cur().indent;
                    loop {
                        match self.cur().kind {
                            TokenKind::Eof => break,
                            TokenKind::Indent => {
                                if self.cur().indent < indent {
                                    break;
                                }
                                self.idx += 1;
                            }
                            _ => self.idx += 1,
                        }
                    }
                }
            }
            _ => {
                while !matches!(self.cur().kind, TokenKind::Indent | TokenKind::Eof) {
                    self.idx += 1;
                }
            }
        }
    }

    pub(crate) fn parse_dot_dot(&mut self) -> Result<Option<RstNode>, ParseError> {
        let col = self.cur().col;
        self.idx += 1; // skip '..'
        let directive = self.get_directive();
        if !directive.is_empty() {
            log::debug!("directive '{}'", directive);
            self.push_ind(col);
            let result = match directive.as_str() {
                "include" => self.dir_include()?,
                "image" => Some(self.dir_image()?),
                "figure" => Some(self.dir_figure()?),
                "code" => Some(self.dir_code_block(false)?),
                "code-block" => Some(self.dir_code_block(true)?),
                "container" => Some(self.dir_container()?),
                "title" => Some(self.dir_title()?),
                "contents" => Some(self.dir_contents()?),
                "index" => Some(self.dir_index()?),
                "raw" => {
                    if self.shared.options.support_raw_directive {
                        Some(self.dir_raw()?)
                    } else {
                        self.msg(MsgKind::InvalidDirective, &directive)?;
                        None
                    }
                }
                _ => {
                    self.msg(MsgKind::InvalidDirective, &directive)?;
                    None
                }
            };
            self.pop_ind();
            Ok(result)
        } else if self.match_pattern(self.idx, " _") {
            // hyperlink target
            self.idx += 2;
            let name = self.get_reference_name(":")?;
            if self.cur().kind == TokenKind::Whitespace {
                self.idx += 1;
            }
            let target = self.until_eol();
            let key = crate::resolver::rstnode_to_refname(&name);
            self.set_ref(key, target)?;
            Ok(None)
        } else if self.match_pattern(self.idx, " |") {
            // substitution definition
            self.idx += 2;
            let name = self.get_reference_name("|")?;
            if self.cur().kind == TokenKind::Whitespace {
                self.idx += 1;
            }
            let value = if eq_ignore_style(&self.cur().text, "replace") {
                self.idx += 2;
                if self.cur().kind == TokenKind::Whitespace {
                    self.idx += 1;
                }
                Some(self.until_eol())
            } else if eq_ignore_style(&self.cur().text, "image") {
                self.idx += 2;
                if self.cur().kind == TokenKind::Whitespace {
                    self.idx += 1;
                }
                Some(self.dir_image()?)
            } else {
                let sym = self.cur().text.clone();
                self.msg(MsgKind::InvalidDirective, &sym)?;
                None
            };
            self.set_sub(name.concat_text(), value);
            Ok(None)
        } else if self.match_pattern(self.idx, " [") {
            // footnote or citation target
            self.idx += 2;
            let name = self.get_reference_name("]")?;
            if self.cur().kind == TokenKind::Whitespace {
                self.idx += 1;
            }
            let target = self.until_eol();
            let key = crate::resolver::rstnode_to_refname(&name);
            self.set_ref(key, target)?;
            Ok(None)
        } else {
            self.parse_comment();
            Ok(None)
        }
    }
}
