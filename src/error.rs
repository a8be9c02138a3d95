use std::io;

use thiserror::Error;

use crate::min_heap::HeapErr;
use crate::Symbol;

/// Errors produced while building, encoding, decoding or persisting Huffman data.
#[derive(Debug, Error)]
pub enum HuffmanError {
    #[error("heap error: {0}")]
    Heap(#[from] HeapErr),

    #[error("symbol {symbol} is outside the {size}-symbol alphabet")]
    SymbolOutOfRange { symbol: Symbol, size: usize },

    #[error("subtree weights {left} + {right} overflow u64")]
    WeightOverflow { left: u64, right: u64 },

    #[error("symbol {0} has no code in the table")]
    SymbolNotInTable(Symbol),

    #[error("invalid bit {found:?} at index {index}, expected '0' or '1'")]
    InvalidBit { index: usize, found: char },

    /// The bit-string ended between the root and a leaf.
    #[error("bit-string ended mid-code after {decoded} symbols ({dangling_bits} dangling bits)")]
    DecodeTruncated { decoded: usize, dangling_bits: usize },

    #[error("invalid tree: {0}")]
    DecodeInvalidTree(String),

    #[error("malformed tree text at byte {position}: {reason}")]
    SerializationParse { position: usize, reason: String },

    #[error("unsupported container tag {0:?}")]
    UnsupportedFormatTag(String),

    #[error("bit length {bit_len} exceeds the {available} bits held by the buffer")]
    BitLengthOverflow { bit_len: usize, available: usize },

    #[error("invalid image dimensions {width}x{height}x{channels}")]
    InvalidDimensions { width: i64, height: i64, channels: i64 },

    #[error("pixel buffer holds {actual} samples, dimensions need {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },

    #[error("decoded output differs from the input at sample {0}")]
    RoundtripMismatch(usize),

    #[error("malformed container: {0}")]
    Container(String),

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HuffmanError {
    pub(crate) fn parse(position: usize, reason: impl Into<String>) -> Self {
        HuffmanError::SerializationParse {
            position,
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for Huffman operations.
pub type Result<T> = std::result::Result<T, HuffmanError>;
