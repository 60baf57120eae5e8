//! Block structure tests: headings, lists, tables, literal blocks, line
//! blocks, transitions, and block quotes.

use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;
use rstext::{parse_source, Diagnostic, MsgHandler, MsgKind, NodeKind, Options, RstNode};

fn parse_ok(text: &str) -> RstNode {
    parse_source(text, Options::default()).unwrap().doc
}

fn collecting() -> (MsgHandler, Rc<RefCell<Vec<Diagnostic>>>) {
    let store: Rc<RefCell<Vec<Diagnostic>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = store.clone();
    let handler: MsgHandler = Box::new(move |diag: &Diagnostic| {
        sink.borrow_mut().push(diag.clone());
        Ok(())
    });
    (handler, store)
}

fn find_kind(n: &RstNode, kind: NodeKind) -> Option<RstNode> {
    if n.kind == kind {
        return Some(n.clone());
    }
    n.children.iter().find_map(|c| find_kind(c, kind))
}

#[test]
fn headline_and_body() {
    let doc = parse_ok("Title\n=====\n\nbody\n");
    assert_eq!(doc.children[0].kind, NodeKind::Headline);
    assert_eq!(doc.children[0].level, 1);
    assert_eq!(doc.children[0].concat_text(), "Title");
    assert_eq!(doc.children[1].kind, NodeKind::Paragraph);
    assert_eq!(doc.children[1].concat_text().trim(), "body");
}

#[test]
fn underline_characters_get_stable_levels() {
    let doc = parse_ok("AA\n====\n\nBB\n----\n\nCC\n====\n");
    let heads: Vec<&RstNode> = doc
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::Headline)
        .collect();
    assert_eq!(heads.len(), 3);
    assert_eq!(heads[0].level, 1);
    assert_eq!(heads[1].level, 2);
    assert_eq!(heads[2].level, 1);
}

#[test]
fn overline_heading() {
    let doc = parse_ok("======\nTitle\n======\n\nbody\n");
    let over = find_kind(&doc, NodeKind::Overline).expect("overline");
    assert_eq!(over.level, 1);
    assert_eq!(over.concat_text(), "Title");
}

#[test]
fn overline_missing_closing_adornment_is_tolerated() {
    let doc = parse_ok("======\nTitle\n");
    let over = find_kind(&doc, NodeKind::Overline).expect("overline");
    assert_eq!(over.concat_text(), "Title");
}

#[test]
fn overline_and_underline_levels_are_separate() {
    let doc = parse_ok("======\nA\n======\n\nB\n======\n");
    let over = find_kind(&doc, NodeKind::Overline).expect("overline");
    let head = find_kind(&doc, NodeKind::Headline).expect("headline");
    assert_eq!(over.level, 1);
    assert_eq!(head.level, 1);
}

#[test]
fn transition_between_paragraphs() {
    let doc = parse_ok("a\n\n-----\n\nb\n");
    assert!(find_kind(&doc, NodeKind::Transition).is_some());
}

#[test]
fn adornment_on_last_line_is_a_transition() {
    // nothing follows, so this cannot open an overline heading
    let doc = parse_ok("a\n\n-----\n");
    assert!(find_kind(&doc, NodeKind::Transition).is_some());
    assert!(find_kind(&doc, NodeKind::Overline).is_none());
}

#[test]
fn bullet_list_two_items() {
    let doc = parse_ok("* a\n* b\n");
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::BulletList);
    assert_eq!(list.children.len(), 2);
    for (item, text) in list.children.iter().zip(["a", "b"]) {
        assert_eq!(item.kind, NodeKind::BulletItem);
        assert_eq!(item.children[0].kind, NodeKind::Paragraph);
        assert_eq!(item.children[0].concat_text().trim(), text);
    }
}

#[test]
fn bullet_item_spans_continuation_lines() {
    let doc = parse_ok("* line1\n  line2\n");
    let list = &doc.children[0];
    assert_eq!(list.children.len(), 1);
    assert_eq!(
        list.children[0].concat_text().trim(),
        "line1 line2"
    );
}

#[test]
fn bullet_list_ends_at_different_marker() {
    let doc = parse_ok("* a\n- b\n");
    let lists: Vec<&RstNode> = doc
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::BulletList)
        .collect();
    assert_eq!(lists.len(), 2);
}

#[rstest]
#[case("1. one\n2. two\n")]
#[case("a) one\nb) two\n")]
#[case("(a) one\n(b) two\n")]
#[case("(1) one\n(#) two\n")]
fn enum_list_marker_styles(#[case] input: &str) {
    let doc = parse_ok(input);
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::EnumList);
    assert_eq!(list.children.len(), 2);
    assert_eq!(list.children[0].kind, NodeKind::EnumItem);
}

#[test]
fn enum_list_requires_homogeneous_markers() {
    let doc = parse_ok("1. one\n2) two\n");
    let lists: Vec<&RstNode> = doc
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::EnumList)
        .collect();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].children.len(), 1);
}

#[test]
fn definition_list_structure() {
    let doc = parse_ok("term\n    meaning\n");
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::DefList);
    let item = &list.children[0];
    assert_eq!(item.kind, NodeKind::DefItem);
    assert_eq!(item.children[0].kind, NodeKind::DefName);
    assert_eq!(item.children[0].concat_text(), "term");
    assert_eq!(item.children[1].kind, NodeKind::DefBody);
    assert_eq!(item.children[1].concat_text().trim(), "meaning");
}

#[test]
fn definition_list_two_items() {
    let doc = parse_ok("one\n    first\ntwo\n    second\n");
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::DefList);
    assert_eq!(list.children.len(), 2);
}

#[test]
fn option_list_structure() {
    let doc = parse_ok("-f  file flag\n--long  other flag\n");
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::OptionList);
    assert_eq!(list.children.len(), 2);
    let item = &list.children[0];
    assert_eq!(item.kind, NodeKind::OptionListItem);
    assert_eq!(item.children[0].kind, NodeKind::OptionGroup);
    assert_eq!(item.children[0].concat_text(), "-f");
    assert_eq!(item.children[1].kind, NodeKind::Description);
    assert!(item.children[1].concat_text().contains("file flag"));
    assert_eq!(list.children[1].children[0].concat_text(), "--long");
}

#[test]
fn field_list_structure() {
    let doc = parse_ok(":author: someone\n:version: 1\n");
    let list = &doc.children[0];
    assert_eq!(list.kind, NodeKind::FieldList);
    assert_eq!(list.children.len(), 2);
    let field = &list.children[0];
    assert_eq!(field.kind, NodeKind::Field);
    assert_eq!(field.children[0].kind, NodeKind::FieldName);
    assert_eq!(field.children[0].concat_text(), "author");
    assert_eq!(field.children[1].kind, NodeKind::FieldBody);
    assert_eq!(field.children[1].concat_text().trim(), "someone");
    assert_eq!(list.field_value("version").map(|v| v.trim().to_string()), Some("1".into()));
}

#[test]
fn line_block_items() {
    let doc = parse_ok("| first line\n| second line\n");
    let block = &doc.children[0];
    assert_eq!(block.kind, NodeKind::LineBlock);
    assert_eq!(block.children.len(), 2);
    assert_eq!(block.children[0].kind, NodeKind::LineBlockItem);
    assert_eq!(block.children[0].concat_text().trim(), "first line");
}

#[test]
fn paragraph_trailing_colons_open_literal_block() {
    let doc = parse_ok("para::\n\n   code here\n");
    let para = &doc.children[0];
    let literal = find_kind(para, NodeKind::LiteralBlock).expect("literal block");
    assert_eq!(literal.concat_text().trim(), "code here");
    // one of the two colons stays as text
    assert!(para.concat_text().starts_with("para:"));
    assert!(!para.concat_text().starts_with("para::"));
}

#[test]
fn literal_block_preserves_relative_indent() {
    let doc = parse_ok("x::\n\n   if a:\n      b\n");
    let literal = find_kind(&doc, NodeKind::LiteralBlock).expect("literal block");
    assert_eq!(literal.concat_text(), "\nif a:\n   b");
}

#[test]
fn standalone_literal_block() {
    let doc = parse_ok("::\n\n   verbatim\n");
    let literal = find_kind(&doc, NodeKind::LiteralBlock).expect("literal block");
    assert!(literal.concat_text().contains("verbatim"));
}

#[test]
fn indented_block_becomes_block_quote() {
    let doc = parse_ok("para\n\n   quoted\n");
    let quote = find_kind(&doc, NodeKind::BlockQuote).expect("block quote");
    assert_eq!(quote.concat_text().trim(), "quoted");
    // the leading lone paragraph is retagged for inline rendering
    assert_eq!(doc.children[0].kind, NodeKind::Inner);
}

#[test]
fn simple_table_with_header() {
    let doc = parse_ok(concat!(
        "====  ======\n",
        "A     B\n",
        "====  ======\n",
        "a1    b1\n",
        "a2    b2\n",
        "====  ======\n",
    ));
    let table = find_kind(&doc, NodeKind::Table).expect("table");
    assert_eq!(table.children.len(), 3);
    let header = &table.children[0];
    assert_eq!(header.kind, NodeKind::TableRow);
    assert!(header
        .children
        .iter()
        .all(|c| c.kind == NodeKind::TableHeaderCell));
    assert_eq!(header.concat_text().replace(' ', ""), "AB");
    let row = &table.children[1];
    assert!(row.children.iter().all(|c| c.kind == NodeKind::TableDataCell));
    assert_eq!(row.concat_text().replace(' ', ""), "a1b1");
}

#[test]
fn simple_table_without_header() {
    let doc = parse_ok("====  ======\na1    b1\n====  ======\n");
    let table = find_kind(&doc, NodeKind::Table).expect("table");
    assert_eq!(table.children.len(), 1);
    assert!(table.children[0]
        .children
        .iter()
        .all(|c| c.kind == NodeKind::TableDataCell));
}

#[test]
fn simple_table_multiline_cell() {
    let doc = parse_ok(concat!(
        "====  ======\n",
        "a     b1\n",
        "      b2\n",
        "====  ======\n",
    ));
    let table = find_kind(&doc, NodeKind::Table).expect("table");
    let row = &table.children[0];
    let second = row.children[1].concat_text();
    assert!(second.contains("b1"));
    assert!(second.contains("b2"));
}

#[test]
fn grid_table_reports_not_implemented() {
    let input = "+----+\n|  x |\n+----+\n";
    assert!(parse_source(input, Options::default()).is_err());
    let (handler, store) = collecting();
    let out = rstext::parse(input, "", 0, 0, Options::default(), None, Some(handler));
    assert!(out.is_ok());
    assert!(store
        .borrow()
        .iter()
        .any(|d| d.kind == MsgKind::GridTableNotImplemented));
}

#[test]
fn stray_adornment_is_fatal_by_default() {
    let err = parse_source("==== x\n", Options::default()).unwrap_err();
    assert_eq!(err.diagnostic.kind, MsgKind::NewSectionExpected);
}

#[test]
fn diagnostic_positions_are_offset_by_base() {
    let err = parse_source("*open\n\n", Options::default()).unwrap_err();
    assert_eq!(err.diagnostic.line, 0);
    assert_eq!(err.diagnostic.col, 0);
    let err = rstext::parse("*open\n\n", "doc.rst", 10, 4, Options::default(), None, None)
        .unwrap_err();
    assert_eq!(err.diagnostic.filename, "doc.rst");
    assert_eq!(err.diagnostic.line, 10);
    assert_eq!(err.diagnostic.col, 4);
}
