//! Document tree.
//!
//! The parser produces a homogeneous tree of [`RstNode`]s: every node has a
//! [`NodeKind`], an ordered child list, and two payload fields that only
//! some kinds use (`text` for leaves and smileys, `level` for headings).
//! Keeping the node uniform instead of one struct per element keeps the
//! recursive parser and the resolver pass free of conversion layers, and
//! the serde derives make token streams and finished trees directly
//! dumpable as JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Paragraph,
    Headline,
    Emphasis,
    StrongEmphasis,
    TripleEmphasis,
    InlineLiteral,
    InterpretedText,
    LiteralBlock,
    CodeBlock,
    BulletList,
    BulletItem,
    EnumList,
    EnumItem,
    DefList,
    DefName,
    DefBody,
    DefItem,
    OptionList,
    OptionGroup,
    OptionListItem,
    Description,
    FieldList,
    Field,
    FieldName,
    FieldBody,
    DirArg,
    Directive,
    Hyperlink,
    StandaloneHyperlink,
    Ref,
    Idx,
    Sub,
    Sup,
    Smiley,
    GeneralRole,
    SubstitutionReferences,
    Transition,
    Overline,
    Table,
    TableRow,
    TableDataCell,
    TableHeaderCell,
    LineBlock,
    LineBlockItem,
    BlockQuote,
    Inner,
    Leaf,
    Image,
    Figure,
    Title,
    Contents,
    Index,
    Container,
    RawHtml,
    RawLatex,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub level: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RstNode>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl RstNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            level: 0,
            children: Vec::new(),
        }
    }

    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Leaf,
            text: text.into(),
            level: 0,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, child: RstNode) {
        self.children.push(child);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenation of every leaf's text in document order.
    pub fn concat_text(&self) -> String {
        let mut out = String::new();
        self.concat_into(&mut out);
        out
    }

    fn concat_into(&self, out: &mut String) {
        if self.kind == NodeKind::Leaf {
            out.push_str(&self.text);
        } else {
            for child in &self.children {
                child.concat_into(out);
            }
        }
    }

    /// The `DirArg` child of a directive-produced node, if any.
    pub fn directive_arg(&self) -> Option<&RstNode> {
        self.children.iter().find(|c| c.kind == NodeKind::DirArg)
    }

    /// The `FieldList` child of a directive-produced node, if any.
    pub fn field_list(&self) -> Option<&RstNode> {
        self.children.iter().find(|c| c.kind == NodeKind::FieldList)
    }

    /// The body of a directive-produced node: the first child that is
    /// neither the argument nor the option list.
    pub fn directive_body(&self) -> Option<&RstNode> {
        self.children
            .iter()
            .find(|c| c.kind != NodeKind::DirArg && c.kind != NodeKind::FieldList)
    }

    /// Look up a field body by name, matching case-insensitively and
    /// ignoring underscores. `self` may be a `FieldList` or any node
    /// carrying one.
    pub fn field_value(&self, name: &str) -> Option<String> {
        let list = if self.kind == NodeKind::FieldList {
            self
        } else {
            self.field_list()?
        };
        for field in &list.children {
            if field.kind != NodeKind::Field || field.len() < 2 {
                continue;
            }
            if eq_ignore_style(&field.children[0].concat_text(), name) {
                return Some(field.children[1].concat_text());
            }
        }
        None
    }

    /// Indented one-node-per-line rendering, used by the inspection CLI.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.tree_into(&mut out, 0);
        out
    }

    fn tree_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{:?}", self.kind));
        if self.level > 0 {
            out.push_str(&format!(" level={}", self.level));
        }
        if !self.text.is_empty() {
            out.push_str(&format!(" {:?}", self.text));
        }
        out.push('\n');
        for child in &self.children {
            child.tree_into(out, depth + 1);
        }
    }
}

/// String comparison that ignores case and underscores, the rule used for
/// field names and substitution keys.
pub fn eq_ignore_style(a: &str, b: &str) -> bool {
    let mut x = a.chars().filter(|c| *c != '_');
    let mut y = b.chars().filter(|c| *c != '_');
    loop {
        match (x.next(), y.next()) {
            (None, None) => return true,
            (Some(p), Some(q)) => {
                if p.to_ascii_lowercase() != q.to_ascii_lowercase() {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
