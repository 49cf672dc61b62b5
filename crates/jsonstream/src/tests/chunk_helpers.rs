use std::io::Read;

use crate::chunk_utils::{ChunkedReader, produce_chunks};

#[test]
fn produce_chunks_example() {
    let payload = b"[\"foo\",\"bar\"]";
    let chunks = produce_chunks(payload, 5);
    assert_eq!(chunks.concat(), payload);
    assert_eq!(chunks.len(), 5);
    assert_eq!(chunks[0], b"[\"f");
}

#[test]
fn chunked_reader_reassembles_payload() {
    let payload = "[\"f😊o\",\"b🚀r\"]".as_bytes();
    let mut reader = ChunkedReader::from_splits(payload, &[0, 3, 7, 1]);
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, payload);
}
