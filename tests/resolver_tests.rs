//! Resolution pass tests: substitutions, hyperlink references, the
//! environment fallback, and reference-name normalization.

use std::cell::RefCell;
use std::rc::Rc;

use rstest::rstest;
use rstext::{
    parse_source, rstnode_to_refname, Diagnostic, MsgHandler, MsgKind, NodeKind, Options, RstNode,
};

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
fn reference_resolves_to_hyperlink() {
    let doc = parse_ok(".. _label: http://x.y\n\nsee label_.\n");
    let link = find_kind(&doc, NodeKind::Hyperlink).expect("hyperlink");
    assert_eq!(link.children.len(), 2);
    assert_eq!(link.children[0].kind, NodeKind::Inner);
    assert_eq!(link.children[0].concat_text(), "label");
    assert_eq!(link.children[1].concat_text(), "http://x.y");
}

#[test]
fn forward_reference_is_legal() {
    let doc = parse_ok("see label_.\n\n.. _label: http://x.y\n");
    let link = find_kind(&doc, NodeKind::Hyperlink).expect("hyperlink");
    assert_eq!(link.children[1].concat_text(), "http://x.y");
}

#[test]
fn unresolved_reference_is_left_alone() {
    let doc = parse_ok("see nowhere_.\n");
    assert!(find_kind(&doc, NodeKind::Hyperlink).is_none());
    assert!(find_kind(&doc, NodeKind::Ref).is_some());
}

#[test]
fn reference_names_normalize_for_lookup() {
    // definition and use differ in case and spacing
    let doc = parse_ok(".. _My Label: http://x.y\n\nsee `my   label`_.\n");
    let link = find_kind(&doc, NodeKind::Hyperlink).expect("hyperlink");
    assert_eq!(link.children[1].concat_text(), "http://x.y");
}

#[test]
fn substitution_replaces_reference() {
    let doc = parse_ok(".. |version| replace:: 1.2.3\n\nv |version| final\n");
    assert!(find_kind(&doc, NodeKind::SubstitutionReferences).is_none());
    assert!(doc.concat_text().contains("1.2.3"));
}

#[test]
fn substitution_used_twice_is_copied() {
    let doc = parse_ok(".. |v| replace:: 9\n\n|v| and |v|\n");
    assert_eq!(doc.concat_text().matches('9').count(), 2);
}

#[test]
fn substitution_lookup_falls_back_to_ignore_style() {
    let doc = parse_ok(".. |Version| replace:: 2.0\n\n|version|\n");
    assert!(doc.concat_text().contains("2.0"));
}

#[test]
fn substitution_falls_back_to_environment() {
    std::env::set_var("RSTEXT_SUB_TEST", "from-env");
    let doc = parse_ok("value |RSTEXT_SUB_TEST| here\n");
    assert!(doc.concat_text().contains("from-env"));
}

#[test]
fn unknown_substitution_warns_and_stays() {
    let (handler, store) = collecting();
    let out = rstext::parse(
        "x |certainly-not-set-anywhere| y\n",
        "",
        0,
        0,
        Options::default(),
        None,
        Some(handler),
    )
    .unwrap();
    assert!(store
        .borrow()
        .iter()
        .any(|d| d.kind == MsgKind::UnknownSubstitution));
    assert!(find_kind(&out.doc, NodeKind::SubstitutionReferences).is_some());
}

#[test]
fn contents_directive_flags_toc() {
    let out = parse_source("intro\n\n.. contents::\n", Options::default()).unwrap();
    assert!(out.has_toc);
}

#[test]
fn no_contents_no_toc() {
    let out = parse_source("just text\n", Options::default()).unwrap();
    assert!(!out.has_toc);
}

#[rstest]
#[case("Hello World", "hello-world")]
#[case("  leading junk", "leading-junk")]
#[case("many --- separators", "many-separators")]
#[case("123abc", "Z123abc")]
#[case("a  B  c", "a-b-c")]
#[case("trailing! ", "trailing")]
fn refname_normalization(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(rstnode_to_refname(&RstNode::leaf(input)), expected);
}

#[test]
fn refname_has_no_uppercase_or_double_dashes() {
    for input in ["A B C", "x__y", "..a..b..", "Mixed CASE text 42"] {
        let name = rstnode_to_refname(&RstNode::leaf(input));
        assert!(!name.contains("--"), "{:?} -> {:?}", input, name);
        assert!(
            name.chars().filter(|c| c.is_ascii_uppercase()).all(|c| c == 'Z'),
            "{:?} -> {:?}",
            input,
            name
        );
    }
}

#[test]
fn refname_is_idempotent_on_lowercase_output() {
    for input in ["Hello World", "some_label", "a b c 1 2"] {
        let once = rstnode_to_refname(&RstNode::leaf(input));
        if !once.starts_with('Z') {
            let twice = rstnode_to_refname(&RstNode::leaf(once.clone()));
            assert_eq!(once, twice);
        }
    }
}
