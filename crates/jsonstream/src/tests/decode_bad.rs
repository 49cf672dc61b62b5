use rstest::rstest;

use crate::{
    DecodeError, Decoder, DecoderOptions, ExtractError, PatternError, RegistrationError,
    SyntaxError, Value,
};

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("rejected {0}")]
struct Rejected(i64);

fn decode_ignoring(input: &str, pattern: &str) -> Result<Vec<String>, DecodeError> {
    let mut seen = Vec::new();
    let mut decoder = Decoder::from_slice(input.as_bytes());
    decoder
        .on(pattern, |path, _: Value| {
            seen.push(path.to_owned());
            Ok(())
        })
        .unwrap();
    decoder.decode()?;
    Ok(seen)
}

#[test]
fn truncated_input_fails_after_earlier_handlers() {
    let mut seen = Vec::new();
    let mut decoder = Decoder::from_slice(br#"{"a": [1, 2"#);
    decoder
        .on("$.a[*]", |_, n: i32| {
            seen.push(n);
            Ok(())
        })
        .unwrap();
    let err = decoder.decode().unwrap_err();

    assert_eq!(seen, [1, 2]);
    let token = err.as_token_error().unwrap();
    assert!(matches!(token.kind(), SyntaxError::UnexpectedEndOfInput));
    assert_eq!((token.line, token.column), (1, 12));
    assert_eq!(err.to_string(), "unexpected end of input at 1:12");
}

#[rstest]
#[case("")]
#[case("   \n")]
#[case("{")]
#[case(r#"{"a": {"b": ["#)]
#[case(r#"{"a": "unterminated"#)]
#[case("[1, 2, 3")]
fn truncated_without_handlers(#[case] input: &str) {
    let err = Decoder::from_slice(input.as_bytes()).decode().unwrap_err();
    assert!(
        matches!(
            err.as_token_error().map(crate::TokenError::kind),
            Some(SyntaxError::UnexpectedEndOfInput)
        ),
        "{err}"
    );
}

#[test]
fn handler_error_is_preserved() {
    let mut seen = Vec::new();
    let mut decoder = Decoder::from_slice(br#"{"key": [1, 2, 3]}"#);
    decoder
        .on("$.key[*]", |_, n: i64| {
            if n == 2 {
                return Err(Rejected(n).into());
            }
            seen.push(n);
            Ok(())
        })
        .unwrap();
    let err = decoder.decode().unwrap_err();

    assert_eq!(seen, [1]);
    assert_eq!(err.to_string(), "handler for $.key[1] failed: rejected 2");
    assert!(err.handler_error().unwrap().is::<Rejected>());

    let source = err.into_handler_error().unwrap();
    assert_eq!(*source.downcast::<Rejected>().unwrap(), Rejected(2));
}

#[test]
fn handler_error_from_string() {
    let mut decoder = Decoder::from_slice(b"[true]");
    decoder.on("$[0]", |_, _: bool| Err("nope".into())).unwrap();
    let err = decoder.decode().unwrap_err();
    assert_eq!(err.to_string(), "handler for $[0] failed: nope");
    assert!(err.as_token_error().is_none());
}

#[test]
fn handler_propagates_its_own_error_with_question_mark() {
    fn check(n: i64) -> Result<(), Rejected> {
        if n < 0 {
            return Err(Rejected(n));
        }
        Ok(())
    }

    let mut decoder = Decoder::from_slice(b"[3, -4]");
    decoder
        .on("$[*]", |_, n: i64| {
            check(n)?;
            Ok(())
        })
        .unwrap();
    let err = decoder.decode().unwrap_err();
    assert_eq!(err.to_string(), "handler for $[1] failed: rejected -4");
    assert_eq!(err.handler_error().unwrap().downcast_ref::<Rejected>(), Some(&Rejected(-4)));
}

#[test]
fn extract_error_names_the_path() {
    let mut decoder = Decoder::from_slice(br#"{"items": [{"n": 1}, {"n": "five"}]}"#);
    decoder.on("$.items[*].n", |_, _: u32| Ok(())).unwrap();
    let err = decoder.decode().unwrap_err();

    let DecodeError::Extract(extract) = &err else {
        panic!("expected an extract error, got {err:?}");
    };
    assert_eq!(
        *extract,
        ExtractError {
            path: "$.items[1].n".into(),
            message: "invalid type: string \"five\", expected u32".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "cannot decode value at $.items[1].n: invalid type: string \"five\", expected u32"
    );
}

#[test]
fn malformed_input_inside_matched_value_is_a_token_error() {
    let mut decoder = Decoder::from_slice(br#"{"a": [1, 2,]}"#);
    decoder.on("$.a", |_, _: Vec<u8>| Ok(())).unwrap();
    let err = decoder.decode().unwrap_err();
    assert!(matches!(
        err.as_token_error().map(crate::TokenError::kind),
        Some(SyntaxError::InvalidCharacter(']'))
    ));
}

#[test]
fn skipped_subtrees_are_still_validated() {
    let err = decode_ignoring(r#"{"a": 1, "b": {"c": [1, }}"#, "$.a").unwrap_err();
    let token = err.as_token_error().unwrap();
    assert!(matches!(token.kind(), SyntaxError::InvalidCharacter('}')));
    assert_eq!((token.line, token.column), (1, 25));
}

#[rstest]
#[case("{} x", 1, 4)]
#[case("{}{}", 1, 3)]
#[case("1 2", 1, 3)]
#[case("[]\n]", 2, 1)]
fn trailing_data(#[case] input: &str, #[case] line: usize, #[case] column: usize) {
    let err = decode_ignoring(input, "$").unwrap_err();
    let token = err.as_token_error().unwrap();
    assert!(matches!(token.kind(), SyntaxError::TrailingCharacters), "{err}");
    assert_eq!((token.line, token.column), (line, column));
}

#[test]
fn depth_limit() {
    let deep = format!("{}{}", "[".repeat(200), "]".repeat(200));
    let err = decode_ignoring(&deep, "$.never").unwrap_err();
    assert!(matches!(
        err.as_token_error().map(crate::TokenError::kind),
        Some(SyntaxError::DepthLimitExceeded(128))
    ));

    let options = DecoderOptions {
        max_depth: 256,
        ..Default::default()
    };
    let summary = Decoder::with_options(deep.as_bytes(), options).decode().unwrap();
    assert_eq!(summary.documents, 1);
}

#[rstest]
#[case("", PatternError::Empty)]
#[case("items[*]", PatternError::MissingRoot)]
#[case("$.items[", PatternError::UnterminatedIndex(7))]
#[case("$.items[x]", PatternError::InvalidIndex(8))]
#[case("$.items.", PatternError::EmptyKey(8))]
fn bad_patterns_are_rejected_at_registration(#[case] pattern: &str, #[case] expected: PatternError) {
    let mut decoder = Decoder::from_slice(b"{}");
    let err = decoder.on(pattern, |_, _: Value| Ok(())).unwrap_err();
    assert_eq!(
        err,
        RegistrationError::InvalidPattern {
            pattern: pattern.to_owned(),
            source: expected,
        }
    );
    assert!(err.to_string().starts_with(&format!("invalid pattern {pattern:?}: ")));
}
