#![expect(missing_docs)]

use std::{cell::RefCell, io::Cursor};

use jsonstream::{DecodeError, Decoder, DecoderOptions, HandlerError};
use serde::Deserialize;

mod common;

use crate::common::{ORIGINAL, STREAM, StreamReader};

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Decision {
    Allow,
    Block,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Moderation {
    decision: Decision,
    reason: Option<String>,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct Entity {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    line: u32,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Options {
    opt_level: String,
    features: Vec<String>,
}

#[test]
fn structs_from_a_streamed_document() {
    let moderation = RefCell::new(None);
    let entities = RefCell::new(Vec::new());
    let options = RefCell::new(None);

    let mut decoder = Decoder::new(StreamReader::new(&STREAM));
    decoder
        .on("$.moderation", |_, m: Moderation| {
            *moderation.borrow_mut() = Some(m);
            Ok(())
        })
        .unwrap()
        .on("$.entities[*]", |_, e: Entity| {
            entities.borrow_mut().push(e);
            Ok(())
        })
        .unwrap()
        .on("$.request.options", |_, o: Options| {
            *options.borrow_mut() = Some(o);
            Ok(())
        })
        .unwrap();
    let summary = decoder.decode().unwrap();

    assert_eq!(summary.handlers_invoked, 4);
    assert_eq!(
        moderation.into_inner(),
        Some(Moderation {
            decision: Decision::Allow,
            reason: None,
        })
    );
    assert_eq!(
        entities.into_inner(),
        [
            Entity {
                kind: "function".into(),
                name: "main".into(),
                line: 1,
            },
            Entity {
                kind: "macro".into(),
                name: "println".into(),
                line: 0,
            },
        ]
    );
    assert_eq!(
        options.into_inner(),
        Some(Options {
            opt_level: "2".into(),
            features: vec!["serde".into(), "tokio".into()],
        })
    );
}

#[derive(Debug, thiserror::Error)]
#[error("response blocked: {0}")]
struct Blocked(String);

#[test]
fn handler_aborts_the_stream_early() {
    let input = r#"{"moderation": {"decision": "block", "reason": "unsafe"}, "code": "rm -rf /"#;
    let mut code_seen = false;

    let mut decoder = Decoder::new(Cursor::new(input));
    decoder
        .on("$.moderation", |_, m: Moderation| -> Result<(), HandlerError> {
            if m.decision == Decision::Block {
                return Err(Blocked(m.reason.unwrap_or_default()).into());
            }
            Ok(())
        })
        .unwrap()
        .on("$.code", |_, _: String| {
            code_seen = true;
            Ok(())
        })
        .unwrap();

    // The truncated tail is never read: the handler stops the decode first.
    let err = decoder.decode().unwrap_err();
    let DecodeError::Handler { path, source } = err else {
        panic!("expected a handler error, got {err:?}");
    };
    assert_eq!(path, "$.moderation");
    assert_eq!(source.to_string(), "response blocked: unsafe");
    assert!(source.downcast_ref::<Blocked>().is_some());
    assert!(!code_seen);
}

#[test]
fn json_lines_log() {
    #[derive(Debug, Deserialize)]
    struct Line {
        level: String,
        #[serde(default)]
        fields: serde_json::Map<String, serde_json::Value>,
    }

    let log = "\
{\"level\": \"info\", \"fields\": {\"user\": 1}}
{\"level\": \"warn\"}
{\"level\": \"info\", \"fields\": {}}
";
    let mut levels = Vec::new();
    let mut fields = 0;
    let options = DecoderOptions {
        allow_multiple_json_values: true,
        ..Default::default()
    };
    let mut decoder = Decoder::with_options(log.as_bytes(), options);
    decoder
        .on("$", |_, line: Line| {
            levels.push(line.level);
            fields += line.fields.len();
            Ok(())
        })
        .unwrap();
    let summary = decoder.decode().unwrap();

    assert_eq!(summary.documents, 3);
    assert_eq!(levels, ["info", "warn", "info"]);
    assert_eq!(fields, 1);
}

#[test]
fn matches_serde_json_on_the_whole_document() {
    let mut ours = None;
    let mut decoder = Decoder::from_slice(ORIGINAL.as_bytes());
    decoder
        .on("$", |_, v: serde_json::Value| {
            ours = Some(v);
            Ok(())
        })
        .unwrap();
    decoder.decode().unwrap();

    let theirs: serde_json::Value = serde_json::from_str(ORIGINAL).unwrap();
    assert_eq!(ours, Some(theirs));
}
