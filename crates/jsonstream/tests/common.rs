#![allow(missing_docs)]
#![expect(clippy::needless_raw_string_hashes)]

use std::io::{self, Read};

pub const ORIGINAL: &str = r#"
{
    "moderation": {
        "decision": "allow",
        "reason": null
    },
    "request": {
        "filename": "example.rs",
        "language": "rust",
        "options": {
            "opt_level": "2",
            "features": [
                "serde",
                "tokio"
            ]
        }
    },
    "snippets": [
        "fn main() {}",
        "println!(\"hi\")"
    ],
    "entities": [
        {
            "type": "function",
            "name": "main",
            "line": 1
        },
        {
            "type": "macro",
            "name": "println",
            "line": null
        }
    ],
    "matrix": [
        [
            "a"
        ],
        [],
        [
            "b",
            "c"
        ]
    ],
    "trailing": {
        "status": "ok"
    }
}"#;

// The same document as `ORIGINAL`, compacted and cut on structural seams the
// way a network read would deliver it.
#[rustfmt::skip]
pub const STREAM: [&str; 16] = [
    r#"{"moderation":{"decision":"al"#,                // inside a string value
    r#"lo"#,
    r#"w","reason":null},""#,                           // object end, then a key opens
    r#"request":{"filename":"example.rs""#,
    r#","language":"rust","#,
    r#""options":{"opt_level":"2""#,
    r#","features":["serde""#,
    r#","tokio"]}"#,
    r#"}"#,                                             // '}}' across the boundary
    r#","snippets":["#,
    r#""fn main() {}","#,
    r#""println!(\"hi\")"]"#,
    r#","entities":[{"type":"function","name":"main","line":1},{"type":"macro","name":"println","line":null}]"#,
    r#","matrix":[["a"],[],["b","c"]]"#,
    r#","trailing":{"status":"ok"}"#,
    r#"}"#,
];

/// Serves one chunk per `read` call, like a socket that delivers a response
/// in pieces.
pub struct StreamReader {
    chunks: std::vec::IntoIter<&'static [u8]>,
    current: &'static [u8],
}

impl StreamReader {
    #[must_use]
    pub fn new(chunks: &[&'static str]) -> Self {
        let chunks: Vec<&'static [u8]> = chunks.iter().map(|c| c.as_bytes()).collect();
        Self {
            chunks: chunks.into_iter(),
            current: &[],
        }
    }
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.current.is_empty() {
            match self.chunks.next() {
                Some(chunk) => self.current = chunk,
                None => return Ok(0),
            }
        }
        let n = self.current.len().min(buf.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = &self.current[n..];
        Ok(n)
    }
}

#[test]
fn assert_stream_example() {
    let streamed = STREAM.join("");

    let value: serde_json::Value = serde_json::from_str(ORIGINAL).unwrap();
    let original = serde_json::to_string(&value).unwrap();

    assert_eq!(streamed, original);
}
