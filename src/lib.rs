//! # hachiman
//!
//! Huffman coding for text and for images passed through a left-neighbour
//! predictive filter.
//!
//! ## Quick Start
//!
//! ```rust
//! use hachiman::{ImageCodec, RawImage, TextArchive, TextCodec};
//!
//! // Text: compress, save as a two-line archive, restore
//! let codec = TextCodec::default();
//! let encoding = codec.compress(b"aaabbbbcc")?;
//! assert_eq!(encoding.bits.len(), 14);
//! let saved = encoding.archive().to_string();
//! let archive: TextArchive = saved.parse()?;
//! assert_eq!(codec.decompress_archive(&archive)?, b"aaabbbbcc");
//!
//! // Images: raw samples in, HUFF_IMG_V2 container out
//! let image = RawImage::new(vec![10, 12, 9, 9], 2, 2, 1)?;
//! let mut file = Vec::new();
//! ImageCodec::default().write_container(&image, &mut file)?;
//! let restored = ImageCodec::default().read_container(&mut file.as_slice())?;
//! assert_eq!(restored, image);
//! # Ok::<(), hachiman::HuffmanError>(())
//! ```

pub mod bit_vec;
pub mod cipher;
pub mod code_table;
pub mod config;
pub mod container;
pub mod decoder;
pub mod error;
pub mod huffman_codec;
pub mod hufftree;
pub mod min_heap;
pub mod predictive;
pub mod tree_text;

// Re-export main types for convenience
pub use bit_vec::{pack, unpack, PackedBits};
pub use cipher::ByteCipher;
#[cfg(feature = "aes")]
pub use cipher::Aes128Ctr;
pub use code_table::CodeTable;
pub use config::{CodecConfig, DecodePolicy};
pub use container::{ImageContainer, TextArchive, FORMAT_TAG};
pub use decoder::{decode, decode_exact, DecodeStatus, Decoded};
pub use error::{HuffmanError, Result};
pub use huffman_codec::{
    CompressionStats, HuffmanCodec, ImageCodec, ImageEncoding, RawImage, SymbolReport, TextCodec,
    TextEncoding,
};
pub use hufftree::{Alphabet, FrequencyTable, HuffNode, HuffmanTree, MergeStep, Symbol, TreeBuilder};
pub use min_heap::{HeapErr, MinHeap, Weighted};
