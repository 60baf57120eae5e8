//! Resolution pass.
//!
//! A post-order walk over the finished tree, run once per parse after the
//! whole document is in memory so that forward references are legal.
//! Substitution references are replaced by a copy of the registered value
//! (exact key first, then ignoring case and underscores, then the process
//! environment); named references become hyperlinks around the registered
//! target; a `contents` directive marks the document as wanting a table of
//! contents.

use crate::ast::{eq_ignore_style, NodeKind, RstNode};
use crate::messages::{MsgKind, ParseError};
use crate::parser::Parser;

impl Parser<'_> {
    pub fn resolve_subs(&mut self, mut n: RstNode) -> Result<RstNode, ParseError> {
        match n.kind {
            NodeKind::SubstitutionReferences => {
                let key = n.concat_text();
                if let Some(value) = self.find_sub(&key) {
                    log::trace!("substituting '{}'", key);
                    return Ok(value);
                }
                if let Ok(value) = std::env::var(&key) {
                    if !value.is_empty() {
                        return Ok(RstNode::leaf(value));
                    }
                }
                self.msg(MsgKind::UnknownSubstitution, &key)?;
                Ok(n)
            }
            NodeKind::Ref => {
                let name = rstnode_to_refname(&n);
                if let Some(target) = self.find_ref(&name) {
                    let mut hyperlink = RstNode::new(NodeKind::Hyperlink);
                    n.kind = NodeKind::Inner;
                    hyperlink.add(n);
                    hyperlink.add(target);
                    Ok(hyperlink)
                } else {
                    Ok(n)
                }
            }
            NodeKind::Contents => {
                self.has_toc = true;
                Ok(n)
            }
            NodeKind::Leaf => Ok(n),
            _ => {
                let children = std::mem::take(&mut n.children);
                for child in children {
                    let resolved = self.resolve_subs(child)?;
                    n.children.push(resolved);
                }
                Ok(n)
            }
        }
    }

    fn find_sub(&self, key: &str) -> Option<RstNode> {
        for sub in &self.shared.subs {
            if sub.key == key {
                return sub.value.clone();
            }
        }
        for sub in &self.shared.subs {
            if eq_ignore_style(&sub.key, key) {
                return sub.value.clone();
            }
        }
        None
    }

    fn find_ref(&self, name: &str) -> Option<RstNode> {
        self.shared
            .refs
            .iter()
            .find(|r| r.key == name)
            .map(|r| r.value.clone())
    }
}

/// Normalize a node's text into a reference name: letters lowercased,
/// digits kept (`Z`-prefixed when leading), every other run collapsed into
/// a single `-`, leading separators dropped.
pub fn rstnode_to_refname(n: &RstNode) -> String {
    let mut result = String::new();
    let mut pending_sep = false;
    refname_aux(n, &mut result, &mut pending_sep);
    result
}

fn refname_aux(n: &RstNode, result: &mut String, pending_sep: &mut bool) {
    if n.kind == NodeKind::Leaf {
        for c in n.text.chars() {
            match c {
                '0'..='9' => {
                    if *pending_sep {
                        result.push('-');
                        *pending_sep = false;
                    }
                    if result.is_empty() {
                        result.push('Z');
                    }
                    result.push(c);
                }
                'a'..='z' => {
                    if *pending_sep {
                        result.push('-');
                        *pending_sep = false;
                    }
                    result.push(c);
                }
                'A'..='Z' => {
                    if *pending_sep {
                        result.push('-');
                        *pending_sep = false;
                    }
                    result.push(c.to_ascii_lowercase());
                }
                _ => {
                    if !result.is_empty() {
                        *pending_sep = true;
                    }
                }
            }
        }
    } else {
        for child in &n.children {
            refname_aux(child, result, pending_sep);
        }
    }
}
