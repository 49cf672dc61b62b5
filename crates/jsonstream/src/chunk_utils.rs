use std::io::{self, Read};

/// Split `payload` into approximately equal-sized byte chunks.
///
/// Unlike `str` slicing, chunk boundaries may fall inside a UTF-8 code point;
/// the tokenizer works on bytes and has to cope with that.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// A reader that hands out its payload in predetermined pieces, one piece
/// per `read` call, with an `Interrupted` error before every other piece.
pub struct ChunkedReader<'a> {
    chunks: Vec<&'a [u8]>,
    next: usize,
    offset: usize,
    interrupt: bool,
}

impl<'a> ChunkedReader<'a> {
    #[must_use]
    pub fn new(chunks: Vec<&'a [u8]>) -> Self {
        Self {
            chunks,
            next: 0,
            offset: 0,
            interrupt: false,
        }
    }

    /// Cuts `payload` at every position listed in `splits` (taken modulo the
    /// remaining length), mirroring how network reads fragment a stream.
    #[must_use]
    pub fn from_splits(payload: &'a [u8], splits: &[usize]) -> Self {
        let mut chunks = Vec::new();
        let mut rest = payload;
        for split in splits {
            if rest.is_empty() {
                break;
            }
            let (head, tail) = rest.split_at(1 + split % rest.len());
            chunks.push(head);
            rest = tail;
        }
        if !rest.is_empty() {
            chunks.push(rest);
        }
        Self::new(chunks)
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.chunks.get(self.next) else {
            return Ok(0);
        };

        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::ErrorKind::Interrupted.into());
        }

        let remaining = &chunk[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        if self.offset == chunk.len() {
            self.next += 1;
            self.offset = 0;
        }
        Ok(n)
    }
}
