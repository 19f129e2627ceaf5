use easel_data_path::{
    format_path, parse_multi_paths, parse_path, parse_single_path, PathSegment, SyntaxErrorKind,
};
use proptest::prelude::*;

fn field(s: &str) -> PathSegment {
    PathSegment::Field(s.to_string())
}

#[test]
fn observer_paths_matrix() {
    let cases = [
        ("a", false),
        ("a.b", false),
        ("a[0]", false),
        ("_x.y1", false),
        ("a.**", true),
        ("**", true),
    ];
    for (input, wildcard) in cases {
        let p = parse_path(input).unwrap_or_else(|e| panic!("{input}: {e}"));
        assert_eq!(p.wildcard, wildcard, "{input}");
        assert_eq!(p.to_string(), input);
    }
}

#[test]
fn observer_path_errors_matrix() {
    let cases = [
        ("a..b", SyntaxErrorKind::FieldIllegal),
        (".a", SyntaxErrorKind::FirstFieldIllegal),
        ("", SyntaxErrorKind::FirstFieldIllegal),
        ("0", SyntaxErrorKind::FieldStartsWithDigit),
        ("a[-1]", SyntaxErrorKind::IllegalIndex),
        ("a[1)", SyntaxErrorKind::IllegalIndex),
        ("a]", SyntaxErrorKind::TrailingCharacters),
        ("a b", SyntaxErrorKind::TrailingCharacters),
        ("*", SyntaxErrorKind::FirstFieldIllegal),
    ];
    for (input, kind) in cases {
        let err = parse_path(input).expect_err(input);
        assert_eq!(err.kind, kind, "{input}");
        assert_eq!(err.input, input);
    }
}

#[test]
fn multi_paths_keep_declaration_order() {
    let paths = parse_multi_paths("b, a.c[1], **").unwrap();
    let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["b", "a.c[1]", "**"]);
}

#[test]
fn set_data_keys_matrix() {
    assert_eq!(parse_single_path("a").unwrap(), vec![field("a")]);
    assert_eq!(
        parse_single_path("a.b[3]").unwrap(),
        vec![field("a"), field("b"), PathSegment::Index(3)]
    );
    assert_eq!(parse_single_path("[3]").unwrap(), vec![PathSegment::Index(3)]);
    assert_eq!(parse_single_path("1st").unwrap(), vec![field("1st")]);
    assert_eq!(parse_single_path("a-b c").unwrap(), vec![field("a-b c")]);
    assert_eq!(parse_single_path(r"x\.y").unwrap(), vec![field("x.y")]);
}

#[test]
fn set_data_keys_reject_only_illegal_indexes() {
    assert_eq!(parse_single_path("a..b").unwrap(), vec![field("a"), field("b")]);
    for key in ["a[b]", "a[]", "a[99999999999999999999999]"] {
        let err = parse_single_path(key).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::IllegalIndex, "{key}");
    }
}

#[test]
fn format_round_trips_simple_paths() {
    for s in ["a", "a.b", "a[1].b", "list[0][1]"] {
        assert_eq!(format_path(&parse_single_path(s).unwrap()), s);
    }
}

proptest! {
    #[test]
    fn lenient_grammar_never_panics(s in "\\PC*") {
        let _ = parse_single_path(&s);
    }

    #[test]
    fn lenient_grammar_accepts_any_bracket_free_key(s in "[^\\[\\]]*") {
        let path = parse_single_path(&s).unwrap();
        prop_assert!(!path.is_empty());
        prop_assert!(path.iter().all(|seg| !seg.is_index()));
    }

    #[test]
    fn observer_grammar_never_panics(s in "\\PC*") {
        let _ = parse_multi_paths(&s);
    }
}
