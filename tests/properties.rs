//! Property-based invariants over the lexer, the parser, and reference-name
//! normalization.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use rstext::{
    parse_source, rstnode_to_refname, tokenize, Diagnostic, MsgHandler, Options, RstNode,
    TokenKind,
};

fn lenient() -> MsgHandler {
    let store: Rc<RefCell<Vec<Diagnostic>>> = Rc::new(RefCell::new(Vec::new()));
    Box::new(move |diag: &Diagnostic| {
        store.borrow_mut().push(diag.clone());
        Ok(())
    })
}

proptest! {
    #[test]
    fn lexing_is_total(text in any::<String>()) {
        let mut tokens = Vec::new();
        tokenize(&text, false, &mut tokens);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        prop_assert_eq!(eofs, 1);
    }

    #[test]
    fn indent_tokens_carry_their_own_spaces(text in any::<String>()) {
        let mut tokens = Vec::new();
        tokenize(&text, false, &mut tokens);
        // index 0 may be a converted leading-whitespace token and keeps its
        // original text; every lexed indent is a newline plus its spaces
        for tok in tokens.iter().skip(1) {
            if tok.kind == TokenKind::Indent {
                let expected = format!("\n{}", " ".repeat(tok.indent));
                prop_assert_eq!(&tok.text, &expected);
            }
        }
    }

    #[test]
    fn refname_output_alphabet(text in any::<String>()) {
        let name = rstnode_to_refname(&RstNode::leaf(text));
        prop_assert!(!name.contains("--"));
        for (i, c) in name.chars().enumerate() {
            let ok = c == '-'
                || c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || (c == 'Z' && i == 0);
            prop_assert!(ok, "bad char {:?} in {:?}", c, name);
        }
    }

    #[test]
    fn refname_idempotent_unless_digit_prefixed(text in any::<String>()) {
        let once = rstnode_to_refname(&RstNode::leaf(text));
        if !once.starts_with('Z') {
            let twice = rstnode_to_refname(&RstNode::leaf(once.clone()));
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn plain_words_survive_parsing(words in proptest::collection::vec("[a-z]{1,8}", 1..6)) {
        let text = words.join(" ");
        let doc = parse_source(&text, Options::default()).unwrap().doc;
        let flat = doc.concat_text();
        for word in &words {
            prop_assert!(flat.contains(word.as_str()), "{:?} lost from {:?}", word, flat);
        }
    }

    #[test]
    fn parsing_terminates_without_panicking(text in "[ -~\n]{0,60}") {
        let result = rstext::parse(&text, "", 0, 0, Options::default(), None, Some(lenient()));
        prop_assert!(result.is_ok());
    }
}
