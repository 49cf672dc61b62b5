//! Reacts to content-moderation feedback while a tool-call response from an
//! LLM is still arriving.
//!
//! The assistant was prompted with a tool description that yields a JSON
//! object describing a generated code snippet. The `moderation` field comes
//! first so that a policy violation can be acted on before the (possibly
//! large) snippet has been transferred:
//!
//! ```text
//! {
//!   "moderation": {
//!     "decision": "allow" | "block",
//!     "reason":   string | null
//!   }
//!   "filename":   string,
//!   "language":   string,
//!   "code":       string,
//! }
//! ```
//!
//! The response is read from a reader that hands out one small, irregular
//! chunk per `read` call, the way `chat.completions` style APIs deliver
//! partial tokens. Each handler receives its value as soon as the value is
//! complete. A `"block"` decision returns an error from the handler, which
//! stops the decode without reading the rest of the stream.
//!
//! Run with
//!
//! ```bash
//! RUST_LOG=jsonstream=trace cargo run -p jsonstream --example tool_call_stream
//! ```

#![allow(clippy::needless_raw_string_hashes)]
#![allow(clippy::doc_markdown)]

use std::{
    cell::RefCell,
    io::{self, Read},
};

use jsonstream::{DecodeError, Decoder, HandlerError};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Decision {
    Allow,
    Block,
}

#[derive(Debug, Deserialize)]
struct Moderation {
    decision: Decision,
    reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("moderation blocked the content: {0}")]
struct Blocked(String);

/// Serves one chunk per `read` call and counts how many were consumed.
struct Simulated<'a> {
    chunks: &'a [&'a str],
    current: &'a [u8],
    delivered: usize,
}

impl<'a> Simulated<'a> {
    fn new(chunks: &'a [&'a str]) -> Self {
        Self {
            chunks,
            current: &[],
            delivered: 0,
        }
    }
}

impl Read for Simulated<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.current.is_empty() {
            let Some((first, rest)) = self.chunks.split_first() else {
                return Ok(0);
            };
            self.current = first.as_bytes();
            self.chunks = rest;
            self.delivered += 1;
        }
        let n = self.current.len().min(buf.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = &self.current[n..];
        Ok(n)
    }
}

/// Decodes one streamed response and returns a transcript of what the
/// handlers saw.
fn handle_response(chunks: &[&str]) -> String {
    let transcript = RefCell::new(String::new());
    let log = |line: String| {
        println!("{line}");
        let mut transcript = transcript.borrow_mut();
        transcript.push_str(&line);
        transcript.push('\n');
    };

    let mut reader = Simulated::new(chunks);
    let mut decoder = Decoder::new(&mut reader);
    decoder
        .on("$.moderation", |_, m: Moderation| -> Result<(), HandlerError> {
            match m.decision {
                Decision::Allow => {
                    log("moderation: allow".to_owned());
                    Ok(())
                }
                Decision::Block => Err(Blocked(m.reason.unwrap_or_default()).into()),
            }
        })
        .and_then(|d| {
            d.on("$.filename", |_, name: String| {
                log(format!("file: {name}"));
                Ok(())
            })
        })
        .and_then(|d| {
            d.on("$.code", |_, code: String| {
                log(format!("code: {} lines", code.lines().count()));
                for line in code.lines() {
                    log(format!("  | {line}"));
                }
                Ok(())
            })
        })
        .expect("patterns are valid");

    match decoder.decode() {
        Ok(summary) => log(format!(
            "done: {} handlers, {} chunks read",
            summary.handlers_invoked, reader.delivered
        )),
        Err(DecodeError::Handler { path, source }) if source.is::<Blocked>() => log(format!(
            "aborted at {path} after {} of {} chunks: {source}",
            reader.delivered,
            chunks.len()
        )),
        Err(err) => log(format!("failed: {err}")),
    }
    transcript.into_inner()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let allowed: [&str; 10] = [
        r#"{"moderation":{"decision":"al"#,
        r#"lo"#,
        r#"w","reason":null},"#,
        r#""filename":"example.rs","#,
        r#""language":"rust","#,
        r#""code":"use jsonstream::Decoder;\n"#,
        r#"fn main() {\n"#,
        r#"    let _decoder = Decoder::from_slice(b\"{}\");\n"#,
        r#"    println!(\"Hello from jsonstream!\");\n}\n"#,
        r#""}"#,
    ];
    let blocked: [&str; 6] = [
        r#"{"moderation":{"decision":"bl"#,
        r#"ock","reason":"destructive shell command"}"#,
        r#","filename":"cleanup.sh","#,
        r#""language":"sh","#,
        r#""code":"rm -rf "#,
        r#"/\n"}"#,
    ];

    let allowed = handle_response(&allowed);
    let blocked = handle_response(&blocked);

    #[cfg(not(miri))]
    {
        insta::assert_snapshot!(allowed, @r#"
        moderation: allow
        file: example.rs
        code: 5 lines
          | use jsonstream::Decoder;
          | fn main() {
          |     let _decoder = Decoder::from_slice(b"{}");
          |     println!("Hello from jsonstream!");
          | }
        done: 3 handlers, 10 chunks read
        "#);
        insta::assert_snapshot!(blocked, @"aborted at $.moderation after 2 of 6 chunks: moderation blocked the content: destructive shell command");
    }
}
