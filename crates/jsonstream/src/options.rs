/// Configuration options for the [`Decoder`](crate::Decoder).
///
/// # Examples
///
/// ```rust
/// use jsonstream::{Decoder, DecoderOptions};
///
/// let options = DecoderOptions {
///     allow_multiple_json_values: true,
///     ..Default::default()
/// };
/// let decoder = Decoder::with_options(&b"{} {}"[..], options);
/// assert_eq!(decoder.decode().unwrap().documents, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Whether to decode multiple JSON values from a single input stream.
    ///
    /// When `true`, every whitespace-delimited root value is walked in turn,
    /// each one starting again at the root path. This supports formats such
    /// as JSON Lines (JSONL) and newline-delimited JSON (ND-JSON). An input
    /// holding no value at all is then accepted as well.
    ///
    /// When `false`, anything other than whitespace after the first value is
    /// an error.
    ///
    /// # Examples
    ///
    /// ```json
    /// {"id": 1}
    /// {"id": 2}
    /// ```
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_json_values: bool,

    /// Maximum nesting of objects and arrays.
    ///
    /// Traversal and typed extraction both recurse once per level, so this
    /// bounds stack usage for hostile inputs.
    ///
    /// # Default
    ///
    /// `128`
    pub max_depth: usize,

    /// Capacity in bytes of the read buffer placed in front of the input.
    ///
    /// # Default
    ///
    /// `8192`
    pub buffer_capacity: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            allow_multiple_json_values: false,
            max_depth: 128,
            buffer_capacity: 8 * 1024,
        }
    }
}
