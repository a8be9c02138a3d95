use log::warn;

use crate::config::DecodePolicy;
use crate::error::{HuffmanError, Result};
use crate::hufftree::{HuffNode, HuffmanTree, Symbol};

/// Whether the decoder consumed every bit on a symbol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Complete,
    /// The input stopped part way down the tree.
    Truncated { dangling_bits: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub symbols: Vec<Symbol>,
    pub status: DecodeStatus,
}

impl Decoded {
    pub fn is_complete(&self) -> bool {
        self.status == DecodeStatus::Complete
    }

    /// The symbols, or `DecodeTruncated` if decoding stopped early.
    pub fn into_complete(self) -> Result<Vec<Symbol>> {
        match self.status {
            DecodeStatus::Complete => Ok(self.symbols),
            DecodeStatus::Truncated { dangling_bits } => Err(HuffmanError::DecodeTruncated {
                decoded: self.symbols.len(),
                dangling_bits,
            }),
        }
    }
}

fn bit_at(index: usize, found: char) -> Result<bool> {
    match found {
        '0' => Ok(false),
        '1' => Ok(true),
        _ => Err(HuffmanError::InvalidBit { index, found }),
    }
}

/// Walks `tree` for each bit of `bits`, emitting a symbol at every leaf.
///
/// A bit-string that ends mid-code is not an error here; the result is
/// marked [`DecodeStatus::Truncated`]. No tree decodes to nothing.
pub fn decode(bits: &str, tree: Option<&HuffmanTree>) -> Result<Decoded> {
    let tree = match tree {
        Some(tree) => tree,
        None => {
            if !bits.is_empty() {
                warn!("ignoring {} bits decoded without a tree", bits.len());
            }
            return Ok(Decoded {
                symbols: Vec::new(),
                status: DecodeStatus::Complete,
            });
        }
    };
    let root = tree.root();
    let mut symbols = Vec::new();

    // a lone leaf owns the code "0"
    if let HuffNode::Leaf { symbol, .. } = root {
        for (index, ch) in bits.chars().enumerate() {
            if bit_at(index, ch)? {
                return Err(HuffmanError::DecodeInvalidTree(format!(
                    "bit 1 at index {} has no branch in a single-leaf tree",
                    index
                )));
            }
            symbols.push(*symbol);
        }
        return Ok(Decoded {
            symbols,
            status: DecodeStatus::Complete,
        });
    }

    let mut node = root;
    let mut dangling_bits = 0;
    for (index, ch) in bits.chars().enumerate() {
        let bit = bit_at(index, ch)?;
        node = match node {
            HuffNode::Internal { left, right, .. } => {
                if bit {
                    right.as_ref()
                } else {
                    left.as_ref()
                }
            }
            HuffNode::Leaf { .. } => {
                return Err(HuffmanError::DecodeInvalidTree(format!(
                    "traversal stuck on a leaf at bit {}",
                    index
                )))
            }
        };
        match node {
            HuffNode::Leaf { symbol, .. } => {
                symbols.push(*symbol);
                node = root;
                dangling_bits = 0;
            }
            HuffNode::Internal { .. } => dangling_bits += 1,
        }
    }

    let status = if dangling_bits == 0 {
        DecodeStatus::Complete
    } else {
        DecodeStatus::Truncated { dangling_bits }
    };
    Ok(Decoded { symbols, status })
}

/// Like [`decode`], but every bit must be consumed.
pub fn decode_exact(bits: &str, tree: Option<&HuffmanTree>) -> Result<Vec<Symbol>> {
    decode(bits, tree)?.into_complete()
}

/// Decodes according to `policy`. Lenient decoding logs a truncation and
/// returns what was decoded.
pub fn decode_with_policy(
    bits: &str,
    tree: Option<&HuffmanTree>,
    policy: DecodePolicy,
) -> Result<Vec<Symbol>> {
    let decoded = decode(bits, tree)?;
    match (policy, decoded.status) {
        (DecodePolicy::Strict, _) => decoded.into_complete(),
        (DecodePolicy::Lenient, DecodeStatus::Truncated { dangling_bits }) => {
            warn!(
                "bit-string truncated: {} dangling bits after {} symbols",
                dangling_bits,
                decoded.symbols.len()
            );
            Ok(decoded.symbols)
        }
        (DecodePolicy::Lenient, DecodeStatus::Complete) => Ok(decoded.symbols),
    }
}
