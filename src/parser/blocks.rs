//! Block structure.
//!
//! [`Parser::parse_section`] is the driver: it normalizes leading indent
//! tokens against the indent stack (deeper lines open a block quote,
//! shallower lines end the section), classifies the construct at the cursor
//! with [`Parser::which_section`], and dispatches to the matching block
//! parser. Anything unclassified falls back to a paragraph.

use super::Parser;
use crate::ast::{NodeKind, RstNode};
use crate::messages::{MsgKind, ParseError};
use crate::tokenizer::{tokenize, TokenKind};

/// What the classifier decided to parse next. Mostly mirrors the node kind
/// that will be produced; `GridTable` exists only to be reported as
/// unsupported before the paragraph fallback takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Transition,
    Table,
    GridTable,
    Overline,
    Headline,
    LiteralBlock,
    BulletList,
    LineBlock,
    Directive,
    FieldList,
    EnumList,
    DefList,
    OptionList,
    Paragraph,
    Leaf,
}

impl Parser<'_> {
    /// Previous token is an indent at the current required indentation (or
    /// the cursor sits at the start of the stream).
    pub(crate) fn pred_nl(&self) -> bool {
        match self.back(1) {
            None => true,
            Some(prev) => prev.kind == TokenKind::Indent && prev.indent == self.curr_ind(),
        }
    }

    fn is_line_block(&self) -> bool {
        let j = self.token_after_newline();
        (self.cur().col == self.at(j).col && self.at(j).text == "|")
            || self.at(j).col > self.cur().col
    }

    fn is_def_list(&self) -> bool {
        let j = self.token_after_newline();
        self.cur().col < self.at(j).col
            && matches!(
                self.at(j).kind,
                TokenKind::Word | TokenKind::Other | TokenKind::Punct
            )
            && (j < 2 || self.at(j - 2).text != "::")
    }

    fn is_option_list(&self) -> bool {
        self.match_pattern(self.idx, "-w")
            || self.match_pattern(self.idx, "--w")
            || self.match_pattern(self.idx, "/w")
            || self.match_pattern(self.idx, "//w")
    }

    pub(crate) fn which_section(&mut self) -> Result<SectionKind, ParseError> {
        match self.cur().kind {
            TokenKind::Adornment => {
                if self.match_pattern(self.idx + 1, "ii") {
                    Ok(SectionKind::Transition)
                } else if self.match_pattern(self.idx + 1, "iE") {
                    // adornment on the document's last line: nothing can
                    // follow it, so it cannot open an overline heading
                    Ok(SectionKind::Transition)
                } else if self.match_pattern(self.idx + 1, " a") {
                    Ok(SectionKind::Table)
                } else if self.match_pattern(self.idx + 1, "i") {
                    Ok(SectionKind::Overline)
                } else {
                    Ok(SectionKind::Leaf)
                }
            }
            TokenKind::Punct => {
                let text = self.cur().text.clone();
                if self.match_pattern(self.token_after_newline(), "ai") {
                    Ok(SectionKind::Headline)
                } else if text == "::" {
                    Ok(SectionKind::LiteralBlock)
                } else if self.pred_nl()
                    && matches!(text.as_str(), "+" | "*" | "-")
                    && self.peek(1).kind == TokenKind::Whitespace
                {
                    Ok(SectionKind::BulletList)
                } else if text == "|" && self.is_line_block() {
                    Ok(SectionKind::LineBlock)
                } else if text == ".." && self.pred_nl() {
                    Ok(SectionKind::Directive)
                } else if self.match_pattern(self.idx, ":w:") && self.pred_nl() {
                    Ok(SectionKind::FieldList)
                } else if self.match_pattern(self.idx, "(e) ") {
                    Ok(SectionKind::EnumList)
                } else if self.match_pattern(self.idx, "+a+") {
                    self.msg(MsgKind::GridTableNotImplemented, "")?;
                    Ok(SectionKind::GridTable)
                } else if self.is_def_list() {
                    Ok(SectionKind::DefList)
                } else if self.is_option_list() {
                    Ok(SectionKind::OptionList)
                } else {
                    Ok(SectionKind::Paragraph)
                }
            }
            TokenKind::Word | TokenKind::Other | TokenKind::Whitespace => {
                if self.match_pattern(self.token_after_newline(), "ai") {
                    Ok(SectionKind::Headline)
                } else if self.match_pattern(self.idx, "e) ") || self.match_pattern(self.idx, "e. ")
                {
                    Ok(SectionKind::EnumList)
                } else if self.is_def_list() {
                    Ok(SectionKind::DefList)
                } else {
                    Ok(SectionKind::Paragraph)
                }
            }
            _ => Ok(SectionKind::Leaf),
        }
    }

    pub(crate) fn parse_section(&mut self, father: &mut RstNode) -> Result<(), ParseError> {
        loop {
            let mut leave = false;
            while self.cur().kind == TokenKind::Indent {
                if self.curr_ind() == self.cur().indent {
                    self.idx += 1;
                } else if self.cur().indent > self.curr_ind() {
                    let ind = self.cur().indent;
                    self.push_ind(ind);
                    let mut quote = RstNode::new(NodeKind::BlockQuote);
                    self.parse_section(&mut quote)?;
                    self.pop_ind();
                    father.add(quote);
                } else {
                    leave = true;
                    break;
                }
            }
            if leave || self.cur().kind == TokenKind::Eof {
                break;
            }
            let kind = self.which_section()?;
            let parsed: Option<RstNode> = match kind {
                SectionKind::LiteralBlock => {
                    self.idx += 1; // skip '::'
                    Some(self.parse_literal_block()?)
                }
                SectionKind::BulletList => Some(self.parse_bullet_list()?),
                SectionKind::LineBlock => self.parse_line_block()?,
                SectionKind::Directive => self.parse_dot_dot()?,
                SectionKind::EnumList => self.parse_enum_list()?,
                SectionKind::Leaf => {
                    self.msg(MsgKind::NewSectionExpected, "")?;
                    None
                }
                SectionKind::Paragraph | SectionKind::GridTable => None,
                SectionKind::DefList => self.parse_def_list()?,
                SectionKind::FieldList => {
                    if self.idx > 0 {
                        self.idx -= 1;
                    }
                    self.parse_fields()?
                }
                SectionKind::Transition => Some(self.parse_transition()),
                SectionKind::Headline => Some(self.parse_headline()?),
                SectionKind::Overline => Some(self.parse_overline()?),
                SectionKind::Table => Some(self.parse_simple_table()?),
                SectionKind::OptionList => Some(self.parse_option_list()?),
            };
            match parsed {
                Some(node) => father.add(node),
                None if kind != SectionKind::Directive => {
                    let mut par = RstNode::new(NodeKind::Paragraph);
                    self.parse_paragraph(&mut par)?;
                    father.add(par);
                }
                None => {}
            }
        }
        // a leading lone paragraph followed by other content renders inline
        if father.children.len() > 1
            && father.children[0].kind == NodeKind::Paragraph
            && father.children[1].kind != NodeKind::Paragraph
        {
            father.children[0].kind = NodeKind::Inner;
        }
        Ok(())
    }

    /// Inline content until the end of the line.
    pub(crate) fn parse_line(&mut self, father: &mut RstNode) -> Result<(), ParseError> {
        loop {
            match self.cur().kind {
                TokenKind::Punct
                | TokenKind::Adornment
                | TokenKind::Word
                | TokenKind::Other
                | TokenKind::Whitespace => self.parse_inline(father)?,
                TokenKind::Eof | TokenKind::Indent => break,
            }
        }
        Ok(())
    }

    fn parse_paragraph(&mut self, result: &mut RstNode) -> Result<(), ParseError> {
        loop {
            match self.cur().kind {
                TokenKind::Indent => {
                    if self.peek(1).kind == TokenKind::Indent {
                        self.idx += 1;
                        break; // blank line
                    } else if self.cur().indent == self.curr_ind() {
                        self.idx += 1;
                        match self.which_section()? {
                            SectionKind::Paragraph
                            | SectionKind::Leaf
                            | SectionKind::Headline
                            | SectionKind::Overline
                            | SectionKind::Directive => result.add(RstNode::leaf(" ")),
                            SectionKind::LineBlock => {
                                if let Some(lb) = self.parse_line_block()? {
                                    result.add(lb);
                                }
                            }
                            _ => break,
                        }
                    } else {
                        break;
                    }
                }
                TokenKind::Punct => {
                    if self.cur().text == "::"
                        && self.peek(1).kind == TokenKind::Indent
                        && self.curr_ind() < self.peek(1).indent
                    {
                        result.add(RstNode::leaf(":"));
                        self.idx += 1;
                        let block = self.parse_literal_block()?;
                        result.add(block);
                        break;
                    } else {
                        self.parse_inline(result)?;
                    }
                }
                TokenKind::Whitespace
                | TokenKind::Word
                | TokenKind::Adornment
                | TokenKind::Other => self.parse_inline(result)?,
                _ => break,
            }
        }
        Ok(())
    }

    pub(crate) fn parse_literal_block(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::LiteralBlock);
        let mut n = RstNode::leaf("");
        if self.cur().kind == TokenKind::Indent {
            let indent = self.cur().indent;
            self.idx += 1;
            loop {
                match self.cur().kind {
                    TokenKind::Eof => break,
                    TokenKind::Indent => {
                        if self.cur().indent < indent {
                            break;
                        }
                        n.text.push('\n');
                        for _ in indent..self.cur().indent {
                            n.text.push(' ');
                        }
                        self.idx += 1;
                    }
                    _ => {
                        n.text.push_str(&self.cur().text);
                        self.idx += 1;
                    }
                }
            }
        } else {
            while !matches!(self.cur().kind, TokenKind::Indent | TokenKind::Eof) {
                n.text.push_str(&self.cur().text);
                self.idx += 1;
            }
        }
        result.add(n);
        Ok(result)
    }

    fn parse_headline(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::Headline);
        self.parse_line(&mut result)?;
        // classifier guarantees indent + adornment here
        let c = self.peek(1).text.chars().next().unwrap_or('=');
        self.idx += 2;
        result.level = self.shared.underline_level(c);
        Ok(result)
    }

    fn parse_overline(&mut self) -> Result<RstNode, ParseError> {
        let c = self.cur().text.chars().next().unwrap_or('=');
        self.idx += 2;
        let mut result = RstNode::new(NodeKind::Overline);
        loop {
            self.parse_line(&mut result)?;
            if self.cur().kind == TokenKind::Indent {
                let deeper = self.cur().indent > self.curr_ind();
                self.idx += 1;
                if deeper {
                    result.add(RstNode::leaf(" "));
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        result.level = self.shared.overline_level(c);
        if self.cur().kind == TokenKind::Adornment {
            self.idx += 1;
            if self.cur().kind == TokenKind::Indent {
                self.idx += 1;
            }
        }
        Ok(result)
    }

    fn parse_transition(&mut self) -> RstNode {
        let result = RstNode::new(NodeKind::Transition);
        self.idx += 1;
        if self.cur().kind == TokenKind::Indent {
            self.idx += 1;
        }
        if self.cur().kind == TokenKind::Indent {
            self.idx += 1;
        }
        result
    }

    fn parse_bullet_list(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::BulletList);
        let col = self.cur().col;
        let sym = self.cur().text.clone();
        let ind = self.peek(2).col;
        self.push_ind(ind);
        loop {
            let mut item = RstNode::new(NodeKind::BulletItem);
            self.idx += 2; // marker and its whitespace
            self.parse_section(&mut item)?;
            result.add(item);
            if self.cur().kind == TokenKind::Indent
                && self.cur().indent == col
                && self.peek(1).text == sym
                && self.peek(2).kind == TokenKind::Whitespace
            {
                self.idx += 1;
            } else {
                break;
            }
        }
        self.pop_ind();
        Ok(result)
    }

    pub(crate) fn parse_line_block(&mut self) -> Result<Option<RstNode>, ParseError> {
        if self.peek(1).kind != TokenKind::Whitespace {
            return Ok(None);
        }
        let col = self.cur().col;
        let mut result = RstNode::new(NodeKind::LineBlock);
        let ind = self.peek(2).col;
        self.push_ind(ind);
        self.idx += 2;
        loop {
            let mut item = RstNode::new(NodeKind::LineBlockItem);
            self.parse_section(&mut item)?;
            result.add(item);
            if self.cur().kind == TokenKind::Indent
                && self.cur().indent == col
                && self.peek(1).text == "|"
                && self.peek(2).kind == TokenKind::Whitespace
            {
                self.idx += 3;
            } else {
                break;
            }
        }
        self.pop_ind();
        Ok(Some(result))
    }

    fn parse_enum_list(&mut self) -> Result<Option<RstNode>, ParseError> {
        const WILDCARDS: [&str; 3] = ["(e) ", "e) ", "e. "];
        const WILDPOS: [usize; 3] = [1, 0, 0];
        let mut w = 0;
        while w < 3 && !self.match_pattern(self.idx, WILDCARDS[w]) {
            w += 1;
        }
        if w >= 3 {
            return Ok(None);
        }
        let col = self.cur().col;
        let mut result = RstNode::new(NodeKind::EnumList);
        self.idx += WILDPOS[w] + 3;
        let ind = self.cur().col;
        self.push_ind(ind);
        let mut item = RstNode::new(NodeKind::EnumItem);
        self.parse_section(&mut item)?;
        self.pop_ind();
        result.add(item);
        while self.cur().kind == TokenKind::Indent
            && self.cur().indent == col
            && self.match_pattern(self.idx + 1, WILDCARDS[w])
        {
            self.idx += WILDPOS[w] + 4;
            let ind = self.cur().col;
            self.push_ind(ind);
            let mut item = RstNode::new(NodeKind::EnumItem);
            self.parse_section(&mut item)?;
            self.pop_ind();
            result.add(item);
        }
        Ok(Some(result))
    }

    fn parse_def_list(&mut self) -> Result<Option<RstNode>, ParseError> {
        let j = self.token_after_newline().saturating_sub(1);
        if j < 1
            || self.at(j).kind != TokenKind::Indent
            || self.at(j).indent <= self.curr_ind()
            || self.at(j - 1).text == "::"
        {
            return Ok(None);
        }
        let col = self.cur().col;
        let mut result = RstNode::new(NodeKind::DefList);
        loop {
            let mut name = RstNode::new(NodeKind::DefName);
            self.parse_line(&mut name)?;
            if self.cur().kind == TokenKind::Indent
                && self.cur().indent > self.curr_ind()
                && self.peek(1).text != "::"
                && self.peek(1).kind != TokenKind::Indent
            {
                let ind = self.cur().indent;
                self.push_ind(ind);
                let mut body = RstNode::new(NodeKind::DefBody);
                self.parse_section(&mut body)?;
                self.pop_ind();
                let mut item = RstNode::new(NodeKind::DefItem);
                item.add(name);
                item.add(body);
                result.add(item);
                if self.cur().kind == TokenKind::Indent && self.cur().indent == col {
                    self.idx += 1;
                    let j = self.token_after_newline().saturating_sub(1);
                    let more = j >= 1
                        && self.at(j).kind == TokenKind::Indent
                        && self.at(j).indent > col
                        && self.at(j - 1).text != "::";
                    if !more {
                        break;
                    }
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        if result.children.is_empty() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }

    fn parse_option_list(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::OptionList);
        while self.is_option_list() {
            let mut group = RstNode::new(NodeKind::OptionGroup);
            let mut desc = RstNode::new(NodeKind::Description);
            if self.match_pattern(self.idx, "//w") {
                self.idx += 1;
            }
            while !matches!(self.cur().kind, TokenKind::Indent | TokenKind::Eof) {
                if self.cur().kind == TokenKind::Whitespace && self.cur().text.chars().count() > 1 {
                    self.idx += 1;
                    break;
                }
                group.add(self.new_leaf());
                self.idx += 1;
            }
            let j = self.token_after_newline();
            if j > 0
                && self.at(j - 1).kind == TokenKind::Indent
                && self.at(j - 1).indent > self.curr_ind()
            {
                let ind = self.at(j - 1).indent;
                self.push_ind(ind);
                self.parse_section(&mut desc)?;
                self.pop_ind();
            } else {
                self.parse_line(&mut desc)?;
            }
            if self.cur().kind == TokenKind::Indent {
                self.idx += 1;
            }
            let mut item = RstNode::new(NodeKind::OptionListItem);
            item.add(group);
            item.add(desc);
            result.add(item);
        }
        Ok(result)
    }

    pub(crate) fn parse_fields(&mut self) -> Result<Option<RstNode>, ParseError> {
        let at_start = self.idx == 0 && self.at(0).text == ":";
        if !at_start && !(self.cur().kind == TokenKind::Indent && self.peek(1).text == ":") {
            return Ok(None);
        }
        let col = if at_start {
            self.cur().col
        } else {
            self.cur().indent
        };
        let mut result = RstNode::new(NodeKind::FieldList);
        if !at_start {
            self.idx += 1;
        }
        loop {
            result.add(self.parse_field()?);
            if self.cur().kind == TokenKind::Indent
                && self.cur().indent == col
                && self.peek(1).text == ":"
            {
                self.idx += 1;
            } else {
                break;
            }
        }
        Ok(Some(result))
    }

    fn parse_field(&mut self) -> Result<RstNode, ParseError> {
        let mut result = RstNode::new(NodeKind::Field);
        let col = self.cur().col;
        let mut name = RstNode::new(NodeKind::FieldName);
        self.idx += 1; // leading ':'
        self.parse_until(&mut name, ":", false)?;
        let mut body = RstNode::new(NodeKind::FieldBody);
        if self.cur().kind != TokenKind::Indent {
            self.parse_line(&mut body)?;
        }
        if self.cur().kind == TokenKind::Indent && self.cur().indent > col {
            let ind = self.cur().indent;
            self.push_ind(ind);
            self.parse_section(&mut body)?;
            self.pop_ind();
        }
        result.add(name);
        result.add(body);
        Ok(result)
    }

    /// Column boundaries from an adornment line; each column ends where its
    /// adornment run ends, the last column is unbounded.
    fn get_columns(&mut self, cols: &mut Vec<usize>) {
        cols.clear();
        loop {
            cols.push(self.tok_end());
            self.idx += 1;
            if self.cur().kind != TokenKind::Whitespace {
                break;
            }
            self.idx += 1;
            if self.cur().kind != TokenKind::Adornment {
                break;
            }
        }
        if self.cur().kind == TokenKind::Indent {
            self.idx += 1;
        }
        if let Some(last) = cols.last_mut() {
            *last = usize::MAX / 2;
        }
    }

    fn parse_simple_table(&mut self) -> Result<RstNode, ParseError> {
        let mut cols: Vec<usize> = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut result = RstNode::new(NodeKind::Table);
        loop {
            if self.cur().kind == TokenKind::Adornment {
                let last = self.token_after_newline();
                if matches!(self.at(last).kind, TokenKind::Eof | TokenKind::Indent) {
                    // closing adornment line
                    self.idx = last;
                    break;
                }
                self.get_columns(&mut cols);
                row.clear();
                row.resize(cols.len(), String::new());
                // a second adornment line turns the previous row into a header
                if let Some(prev) = result.children.last_mut() {
                    for cell in &mut prev.children {
                        cell.kind = NodeKind::TableHeaderCell;
                    }
                }
            }
            if self.cur().kind == TokenKind::Eof || cols.is_empty() {
                break;
            }
            for s in row.iter_mut() {
                s.clear();
            }
            let line = self.cur().line;
            loop {
                let mut i = 0;
                while !matches!(self.cur().kind, TokenKind::Indent | TokenKind::Eof) {
                    if self.tok_end() <= cols[i] {
                        row[i].push_str(&self.cur().text);
                        self.idx += 1;
                    } else {
                        if self.cur().kind == TokenKind::Whitespace {
                            self.idx += 1;
                        }
                        if i + 1 < cols.len() {
                            i += 1;
                        }
                    }
                }
                if self.cur().kind == TokenKind::Indent {
                    self.idx += 1;
                }
                if self.tok_end() <= cols[0] {
                    break;
                }
                if matches!(self.cur().kind, TokenKind::Eof | TokenKind::Adornment) {
                    break;
                }
                for cell in row.iter_mut().skip(1) {
                    cell.push('\n');
                }
            }
            let filename = self.filename.clone();
            let base_line = self.line + line.saturating_sub(1);
            let mut row_node = RstNode::new(NodeKind::TableRow);
            for (j, cell_text) in row.iter().enumerate() {
                let mut tokens = Vec::new();
                tokenize(cell_text, false, &mut tokens);
                let mut cell = RstNode::new(NodeKind::TableDataCell);
                let base_col = self.col + cols[j].min(32000);
                let doc = {
                    let mut q =
                        Parser::new(tokens, filename.clone(), base_line, base_col, &mut *self.shared);
                    q.parse_doc()?
                };
                cell.add(doc);
                row_node.add(cell);
            }
            result.add(row_node);
        }
        Ok(result)
    }
}
