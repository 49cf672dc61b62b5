#![no_main]
use std::io::{self, Read};

use arbitrary::Arbitrary;
use jsonstream::{Decoder, DecoderOptions, Value};
use libfuzzer_sys::fuzz_target;

static PATTERNS: &[&str] = &["$", "$.*", "$[*]", "$.a", "$.a[*]", "$[*].*", "$.*[0]", "$[*][*][*]"];

#[derive(Debug, Arbitrary)]
struct Input {
    multiple_values: bool,
    /// Index into `PATTERNS`; out of range means no handler.
    pattern: u8,
    /// Bytes handed out per `read` call, plus one.
    split: u8,
    capacity: u8,
    data: Vec<u8>,
}

/// Hands out at most `chunk` bytes per read.
struct Split<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Split<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.len().min(self.chunk).min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn decode(input: &Input) {
    let options = DecoderOptions {
        allow_multiple_json_values: input.multiple_values,
        // Deeper than serde_json's own recursion limit, so anything it
        // accepts is within ours.
        max_depth: 256,
        buffer_capacity: 1 + usize::from(input.capacity),
    };
    let reader = Split {
        data: &input.data,
        chunk: 1 + usize::from(input.split),
    };

    let mut invoked = 0usize;
    let mut decoder = Decoder::with_options(reader, options);
    if let Some(pattern) = PATTERNS.get(usize::from(input.pattern)) {
        decoder
            .on(pattern, |_, _: Value| {
                invoked += 1;
                Ok(())
            })
            .unwrap();
    }
    let result = decoder.decode();

    if let Ok(summary) = &result {
        assert_eq!(summary.handlers_invoked, invoked);
    }

    if !input.multiple_values
        && serde_json::from_slice::<serde_json::Value>(&input.data).is_ok()
    {
        assert!(
            result.is_ok(),
            "serde_json accepted {:?} but the decoder failed: {:?}",
            String::from_utf8_lossy(&input.data),
            result
        );
    }
}

fuzz_target!(|input: Input| decode(&input));
