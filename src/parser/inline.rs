//! Inline markup.
//!
//! Recognition of emphasis, literals, interpreted text, substitution
//! references, URLs and smileys inside a text run. The delicate part is
//! deciding whether a punctuation token opens or closes markup at all;
//! those decisions implement the reStructuredText boundary rules on the
//! characters before and after the marker:
//!
//! - an opener must follow start-of-text, whitespace, or an opening
//!   punctuation character, and must not be preceded by a backslash or
//!   followed by whitespace;
//! - an opener preceded by a quote or bracket must not be immediately
//!   followed by that quote's closing counterpart;
//! - a closer must not follow whitespace and must be followed by
//!   whitespace, end of text, or closing punctuation.

use super::Parser;
use crate::ast::{NodeKind, RstNode};
use crate::messages::{MsgKind, ParseError};
use crate::tokenizer::TokenKind;

const URL_SCHEMES: [&str; 5] = ["http", "https", "ftp", "telnet", "file"];

const SMILEY_START: [char; 3] = [':', ';', '8'];

const SMILEYS: [(&str, &str); 32] = [
    (":D", "icon_e_biggrin"),
    (":-D", "icon_e_biggrin"),
    (":)", "icon_e_smile"),
    (":-)", "icon_e_smile"),
    (";)", "icon_e_wink"),
    (";-)", "icon_e_wink"),
    (":(", "icon_e_sad"),
    (":-(", "icon_e_sad"),
    (":o", "icon_e_surprised"),
    (":shock:", "icon_eek"),
    (":?", "icon_e_confused"),
    (":-?", "icon_e_confused"),
    (":-/", "icon_e_confused"),
    ("8-)", "icon_cool"),
    (":lol:", "icon_lol"),
    (":x", "icon_mad"),
    (":-x", "icon_mad"),
    (":P", "icon_razz"),
    (":-P", "icon_razz"),
    (":oops:", "icon_redface"),
    (":cry:", "icon_cry"),
    (":evil:", "icon_evil"),
    (":twisted:", "icon_twisted"),
    (":roll:", "icon_rolleyes"),
    (":!:", "icon_exclaim"),
    (":?:", "icon_question"),
    (":idea:", "icon_idea"),
    (":arrow:", "icon_arrow"),
    (":|", "icon_neutral"),
    (":-|", "icon_neutral"),
    (":mrgreen:", "icon_mrgreen"),
    (":geek:", "icon_e_geek"),
];

fn closing_for(open: char) -> Option<char> {
    match open {
        '\'' => Some('\''),
        '"' => Some('"'),
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

impl Parser<'_> {
    pub(crate) fn new_leaf(&self) -> RstNode {
        RstNode::leaf(self.cur().text.clone())
    }

    pub fn is_inline_markup_start(&self, markup: &str) -> bool {
        if self.cur().text != markup {
            return false;
        }
        let next = self.peek(1);
        if matches!(
            next.kind,
            TokenKind::Whitespace | TokenKind::Indent | TokenKind::Eof
        ) {
            return false;
        }
        let next_first = next.text.chars().next();
        match self.back(1) {
            None => true,
            Some(prev) => {
                if prev.text == "\\" {
                    return false;
                }
                let prev_first = prev.text.chars().next();
                let opens = matches!(prev.kind, TokenKind::Indent | TokenKind::Whitespace)
                    || matches!(
                        prev_first,
                        Some('\'' | '"' | '(' | '[' | '{' | '<' | '-' | '/' | ':' | '_')
                    );
                if !opens {
                    return false;
                }
                match prev_first.and_then(closing_for) {
                    Some(closer) if next_first == Some(closer) => false,
                    _ => true,
                }
            }
        }
    }

    pub fn is_inline_markup_end(&self, markup: &str) -> bool {
        if self.cur().text != markup {
            return false;
        }
        let prev = match self.back(1) {
            Some(prev) => prev,
            None => return false,
        };
        if matches!(prev.kind, TokenKind::Indent | TokenKind::Whitespace) {
            return false;
        }
        if markup != "``" && prev.text == "\\" {
            return false;
        }
        let next = self.peek(1);
        matches!(
            next.kind,
            TokenKind::Indent | TokenKind::Whitespace | TokenKind::Eof
        ) || matches!(
            next.text.chars().next(),
            Some(
                '\'' | '"' | ')' | ']' | '}' | '>' | '-' | '/' | '\\' | ':' | '.' | ','
                    | ';' | '!' | '?' | '_'
            )
        )
    }

    fn parse_backslash(&mut self, father: &mut RstNode) -> Result<(), ParseError> {
        if self.cur().text == "\\\\" {
            father.add(RstNode::leaf("\\"));
            self.idx += 1;
        } else if self.cur().text == "\\" {
            self.idx += 1;
            match self.cur().kind {
                TokenKind::Eof => {}
                TokenKind::Whitespace => self.idx += 1,
                _ => {
                    father.add(self.new_leaf());
                    self.idx += 1;
                }
            }
        } else {
            father.add(self.new_leaf());
            self.idx += 1;
        }
        Ok(())
    }

    /// Collect inline content up to the closing marker. Indents inside the
    /// markup become single spaces; a blank line or end of input reports a
    /// missing closer at the position where the markup began and returns
    /// what was collected so far.
    pub(crate) fn parse_until(
        &mut self,
        father: &mut RstNode,
        postfix: &str,
        interpret_backslash: bool,
    ) -> Result<(), ParseError> {
        let start_line = self.cur().line;
        let start_col = self.cur().col;
        loop {
            match self.cur().kind {
                TokenKind::Punct => {
                    if self.is_inline_markup_end(postfix) {
                        self.idx += 1;
                        break;
                    } else if interpret_backslash {
                        self.parse_backslash(father)?;
                    } else {
                        father.add(self.new_leaf());
                        self.idx += 1;
                    }
                }
                TokenKind::Adornment | TokenKind::Word | TokenKind::Other => {
                    father.add(self.new_leaf());
                    self.idx += 1;
                }
                TokenKind::Indent => {
                    father.add(RstNode::leaf(" "));
                    self.idx += 1;
                    if self.cur().kind == TokenKind::Indent {
                        self.msg_at(MsgKind::Expected, postfix, start_line, start_col)?;
                        break;
                    }
                }
                TokenKind::Whitespace => {
                    father.add(RstNode::leaf(" "));
                    self.idx += 1;
                }
                TokenKind::Eof => {
                    self.msg_at(MsgKind::Expected, postfix, start_line, start_col)?;
                    break;
                }
            }
        }
        Ok(())
    }

    fn parse_markdown_code_block(&mut self) -> Result<RstNode, ParseError> {
        let mut arg = None;
        if self.cur().kind == TokenKind::Word {
            let mut a = RstNode::new(NodeKind::DirArg);
            a.add(self.new_leaf());
            self.idx += 1;
            arg = Some(a);
        }
        let mut text = String::new();
        loop {
            match self.cur().kind {
                TokenKind::Eof => {
                    self.msg(MsgKind::Expected, "```")?;
                    break;
                }
                TokenKind::Punct if self.cur().text == "```" => {
                    self.idx += 1;
                    break;
                }
                _ => {
                    text.push_str(&self.cur().text);
                    self.idx += 1;
                }
            }
        }
        let mut literal = RstNode::new(NodeKind::LiteralBlock);
        literal.add(RstNode::leaf(text));
        let mut result = RstNode::new(NodeKind::CodeBlock);
        if let Some(a) = arg {
            result.add(a);
        }
        result.add(literal);
        Ok(result)
    }

    /// After interpreted text closed: `_` turns it into a reference or an
    /// embedded-target hyperlink, `:role:` retags it.
    fn parse_post_fix(&mut self, mut n: RstNode) -> Result<RstNode, ParseError> {
        if self.is_inline_markup_end("_") {
            self.idx += 1;
            let embedded = self.back(2).map(|t| t.text == "`").unwrap_or(false)
                && self.back(3).map(|t| t.text == ">").unwrap_or(false);
            if embedded {
                let (label, target) = fixup_embedded_ref(n);
                if label.is_empty() {
                    let mut result = RstNode::new(NodeKind::StandaloneHyperlink);
                    result.add(target);
                    return Ok(result);
                }
                let key = crate::resolver::rstnode_to_refname(&label);
                self.set_ref(key, target.clone())?;
                let mut result = RstNode::new(NodeKind::Hyperlink);
                result.add(label);
                result.add(target);
                return Ok(result);
            } else if n.kind == NodeKind::InterpretedText {
                n.kind = NodeKind::Ref;
            } else {
                let mut result = RstNode::new(NodeKind::Ref);
                result.add(n);
                return Ok(result);
            }
        } else if self.match_pattern(self.idx, ":w:") {
            let role = self.peek(1).text.clone();
            match role.as_str() {
                "idx" => n.kind = NodeKind::Idx,
                "literal" => n.kind = NodeKind::InlineLiteral,
                "strong" => n.kind = NodeKind::StrongEmphasis,
                "emphasis" => n.kind = NodeKind::Emphasis,
                "sub" | "subscript" => n.kind = NodeKind::Sub,
                "sup" | "supscript" => n.kind = NodeKind::Sup,
                _ => {
                    let mut result = RstNode::new(NodeKind::GeneralRole);
                    n.kind = NodeKind::Inner;
                    result.add(n);
                    result.add(RstNode::leaf(role));
                    self.idx += 3;
                    return Ok(result);
                }
            }
            self.idx += 3;
        }
        Ok(n)
    }

    pub(crate) fn is_url(&self, i: usize) -> bool {
        self.at(i + 1).text == ":"
            && self.at(i + 2).text == "//"
            && self.at(i + 3).kind == TokenKind::Word
            && URL_SCHEMES.contains(&self.at(i).text.as_str())
    }

    /// A word is either the start of a standalone URL, or a plain leaf that
    /// a following `_` may turn into a reference.
    fn parse_url(&mut self, father: &mut RstNode) -> Result<(), ParseError> {
        if self.is_url(self.idx) {
            let mut n = RstNode::new(NodeKind::StandaloneHyperlink);
            loop {
                match self.cur().kind {
                    TokenKind::Word | TokenKind::Adornment | TokenKind::Other => {}
                    TokenKind::Punct => {
                        // a URL never ends in punctuation
                        if !matches!(
                            self.peek(1).kind,
                            TokenKind::Word
                                | TokenKind::Adornment
                                | TokenKind::Other
                                | TokenKind::Punct
                        ) {
                            break;
                        }
                    }
                    _ => break,
                }
                n.add(self.new_leaf());
                self.idx += 1;
            }
            father.add(n);
        } else {
            let mut n = self.new_leaf();
            self.idx += 1;
            if self.cur().text == "_" {
                n = self.parse_post_fix(n)?;
            }
            father.add(n);
        }
        Ok(())
    }

    fn parse_smiley(&mut self) -> Option<RstNode> {
        let first = self.cur().text.chars().next()?;
        if !SMILEY_START.contains(&first) {
            return None;
        }
        'next_smiley: for (key, icon) in SMILEYS {
            let mut pos = 0;
            let mut j = self.idx;
            while pos < key.len() {
                let text = &self.at(j).text;
                if text.is_empty() || !key[pos..].starts_with(text.as_str()) {
                    continue 'next_smiley;
                }
                pos += text.len();
                j += 1;
            }
            let mut n = RstNode::new(NodeKind::Smiley);
            n.text = icon.to_string();
            self.idx = j;
            return Some(n);
        }
        None
    }

    /// Parse one inline element at the cursor. Indent and end-of-file are
    /// the caller's business.
    pub(crate) fn parse_inline(&mut self, father: &mut RstNode) -> Result<(), ParseError> {
        match self.cur().kind {
            TokenKind::Punct => {
                if self.is_inline_markup_start("***") {
                    let mut n = RstNode::new(NodeKind::TripleEmphasis);
                    self.idx += 1;
                    self.parse_until(&mut n, "***", true)?;
                    father.add(n);
                } else if self.is_inline_markup_start("**") {
                    let mut n = RstNode::new(NodeKind::StrongEmphasis);
                    self.idx += 1;
                    self.parse_until(&mut n, "**", true)?;
                    father.add(n);
                } else if self.is_inline_markup_start("*") {
                    let mut n = RstNode::new(NodeKind::Emphasis);
                    self.idx += 1;
                    self.parse_until(&mut n, "*", true)?;
                    father.add(n);
                } else if self.shared.options.support_markdown && self.cur().text == "```" {
                    self.idx += 1;
                    let n = self.parse_markdown_code_block()?;
                    father.add(n);
                } else if self.is_inline_markup_start("``") {
                    let mut n = RstNode::new(NodeKind::InlineLiteral);
                    self.idx += 1;
                    self.parse_until(&mut n, "``", false)?;
                    father.add(n);
                } else if self.is_inline_markup_start("`") {
                    let mut n = RstNode::new(NodeKind::InterpretedText);
                    self.idx += 1;
                    self.parse_until(&mut n, "`", true)?;
                    let n = self.parse_post_fix(n)?;
                    father.add(n);
                } else if self.is_inline_markup_start("|") {
                    let mut n = RstNode::new(NodeKind::SubstitutionReferences);
                    self.idx += 1;
                    self.parse_until(&mut n, "|", false)?;
                    father.add(n);
                } else {
                    if self.shared.options.support_smileys {
                        if let Some(n) = self.parse_smiley() {
                            father.add(n);
                            return Ok(());
                        }
                    }
                    self.parse_backslash(father)?;
                }
            }
            TokenKind::Word => {
                if self.shared.options.support_smileys {
                    if let Some(n) = self.parse_smiley() {
                        father.add(n);
                        return Ok(());
                    }
                }
                self.parse_url(father)?;
            }
            TokenKind::Adornment | TokenKind::Other | TokenKind::Whitespace => {
                if self.shared.options.support_smileys {
                    if let Some(n) = self.parse_smiley() {
                        father.add(n);
                        return Ok(());
                    }
                }
                father.add(self.new_leaf());
                self.idx += 1;
            }
            TokenKind::Indent | TokenKind::Eof => {}
        }
        Ok(())
    }
}

/// Split interpreted-text children around the last `<` into the visible
/// label and the embedded target, dropping the `<`, the closing `>`, and a
/// single space in front of the `<` when present.
fn fixup_embedded_ref(n: RstNode) -> (RstNode, RstNode) {
    let mut label = RstNode::new(NodeKind::Inner);
    let mut target = RstNode::new(NodeKind::Inner);
    let len = n.children.len();
    let mut sep = None;
    for i in (0..len.saturating_sub(1)).rev() {
        if n.children[i].text == "<" {
            sep = Some(i);
            break;
        }
    }
    let Some(sep) = sep else {
        label.children = n.children;
        return (label, target);
    };
    let drop_space = sep > 0 && n.children[sep - 1].text.starts_with(' ');
    let label_len = (sep + 1).saturating_sub(if drop_space { 2 } else { 1 });
    for (i, child) in n.children.into_iter().enumerate() {
        if i < label_len {
            label.add(child);
        } else if i > sep && i + 1 < len {
            target.add(child);
        }
    }
    (label, target)
}
