//! Property-based tests for the parser contract.

use proptest::prelude::*;
use tessel::{alt, ignore, opt, regex, seq, text, text_ci, ParseResult, Parser};

/// A source string together with an offset at a character boundary.
fn src_and_index() -> impl Strategy<Value = (String, usize)> {
    "[ab ,ü]{0,12}".prop_flat_map(|src| {
        let bounds: Vec<usize> = src
            .char_indices()
            .map(|(i, _)| i)
            .chain(core::iter::once(src.len()))
            .collect();
        (Just(src), proptest::sample::select(bounds))
    })
}

fn literal() -> impl Strategy<Value = String> {
    "[abü]{0,3}"
}

proptest! {
    #[test]
    fn text_matches_iff_prefix((src, i) in src_and_index(), lit in literal()) {
        let res: ParseResult = text(lit.as_str()).parse(&src, i);
        prop_assert_eq!(res.is_ok(), src[i..].starts_with(&lit));
        if let Ok(token) = res {
            prop_assert_eq!(token.index(), i);
            prop_assert_eq!(token.size(), lit.len());
        }
    }

    #[test]
    fn text_ci_ignores_ascii_case((src, i) in src_and_index(), lit in "[ab]{1,3}") {
        let upper = lit.to_uppercase();
        let res: ParseResult = text_ci(upper).parse(&src, i);
        prop_assert_eq!(res.is_ok(), src[i..].starts_with(&lit));
    }

    #[test]
    fn regex_starts_at_offset((src, i) in src_and_index()) {
        let p = regex("[ab]+").unwrap();
        let res: ParseResult = p.parse(&src, i);
        match res {
            Ok(token) => {
                prop_assert_eq!(token.index(), i);
                prop_assert!(token.end() <= src.len());
                prop_assert!(token.size() > 0);
            }
            Err(e) => {
                prop_assert_eq!(e.index(), i);
                prop_assert!(!src[i..].starts_with(|c| c == 'a' || c == 'b'));
            }
        }
    }

    #[test]
    fn opt_never_fails((src, i) in src_and_index(), lit in literal()) {
        let res: ParseResult = opt(text(lit.as_str())).parse(&src, i);
        let token = res.unwrap();
        prop_assert_eq!(token.index(), i);
        if !src[i..].starts_with(&lit) {
            prop_assert!(token.is_ignore());
            prop_assert_eq!(token.size(), 0);
        }
    }

    #[test]
    fn alt_prefers_first_success((src, i) in src_and_index(), l1 in literal(), l2 in literal()) {
        let p1 = text(l1.as_str());
        let p2 = text(l2.as_str());
        let res: ParseResult = alt((p1.clone(), p2.clone())).parse(&src, i);
        let r1: ParseResult = p1.parse(&src, i);
        let r2: ParseResult = p2.parse(&src, i);
        match (r1, r2) {
            (Ok(t1), _) => prop_assert_eq!(res.unwrap(), t1),
            (Err(_), Ok(t2)) => prop_assert_eq!(res.unwrap(), t2),
            (Err(e1), Err(e2)) => {
                let e = res.unwrap_err();
                prop_assert_eq!(e.index(), i);
                prop_assert!(e.message().contains(&e1.to_string()));
                prop_assert!(e.message().contains(&e2.to_string()));
            }
        }
    }

    #[test]
    fn seq_ignored_prefix_is_spanned((src, i) in src_and_index(), l1 in "[abü]{1,3}", l2 in "[abü]{1,3}") {
        let res: ParseResult = seq((ignore(text(l1.as_str())), text(l2.as_str()))).parse(&src, i);
        if let Ok(token) = res {
            prop_assert_eq!(token.index(), i);
            prop_assert_eq!(token.size(), l1.len() + l2.len());
            let items = token.value().as_tokens().unwrap();
            prop_assert_eq!(items.len(), 1);
            prop_assert_eq!(items[0].index(), i + l1.len());
        }
    }
}
