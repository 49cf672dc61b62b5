mod chunk_helpers;
mod decode_bad;
