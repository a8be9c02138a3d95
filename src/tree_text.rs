//! Preorder text form of a tree.
//!
//! A leaf is written `L<symbol>:<frequency>.` and an internal node is `I`
//! followed by its left and right subtrees. Internal weights are not stored;
//! they are recomputed from the leaves when the text is read back.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::str::FromStr;

use crate::error::{HuffmanError, Result};
use crate::hufftree::{Alphabet, HuffNode, HuffmanTree, Symbol};

pub fn serialize(tree: Option<&HuffmanTree>) -> String {
    let mut out = String::new();
    let Some(tree) = tree else {
        return out;
    };
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        match node {
            HuffNode::Leaf { symbol, weight } => {
                // writing into a String cannot fail
                let _ = write!(out, "L{}:{}.", symbol, weight);
            }
            HuffNode::Internal { left, right, .. } => {
                out.push('I');
                stack.push(right.as_ref());
                stack.push(left.as_ref());
            }
        }
    }
    out
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Reads decimal digits up to and including `terminator`.
    fn number<T: FromStr>(&mut self, terminator: u8, what: &str) -> Result<T> {
        let start = self.pos;
        loop {
            match self.next() {
                Some(b) if b == terminator => break,
                Some(b) if b.is_ascii_digit() => {}
                Some(b) => {
                    return Err(HuffmanError::parse(
                        self.pos - 1,
                        format!("unexpected {:?} in {}", b as char, what),
                    ))
                }
                None => {
                    return Err(HuffmanError::parse(
                        self.pos,
                        format!("input ended before {:?} after {}", terminator as char, what),
                    ))
                }
            }
        }
        let digits = &self.bytes[start..self.pos - 1];
        if digits.is_empty() {
            return Err(HuffmanError::parse(start, format!("empty {}", what)));
        }
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| HuffmanError::parse(start, format!("{} out of range", what)))
    }
}

/// Parses tree text produced by [`serialize`].
///
/// An empty string is the empty tree. Anything malformed, including trailing
/// data, symbols outside `alphabet`, zero frequencies and repeated symbols,
/// is a `SerializationParse` error.
pub fn deserialize(text: &str, alphabet: Alphabet) -> Result<Option<HuffmanTree>> {
    if text.is_empty() {
        return Ok(None);
    }
    let mut cursor = Cursor {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let mut seen = BTreeSet::new();
    // internal nodes still waiting for children; Some holds a finished left child
    let mut open: Vec<Option<HuffNode>> = Vec::new();

    let root = 'tokens: loop {
        let start = cursor.pos;
        let mut node = match cursor.next() {
            Some(b'I') => {
                // a tree over n symbols is never deeper than n - 1
                if open.len() + 1 >= alphabet.size() {
                    return Err(HuffmanError::parse(start, "nesting deeper than the alphabet allows"));
                }
                open.push(None);
                continue;
            }
            Some(b'L') => {
                let symbol: Symbol = cursor.number(b':', "symbol")?;
                let weight: u64 = cursor.number(b'.', "frequency")?;
                if !alphabet.contains(symbol) {
                    return Err(HuffmanError::parse(
                        start,
                        format!("symbol {} outside the {}-symbol alphabet", symbol, alphabet.size()),
                    ));
                }
                if weight == 0 {
                    return Err(HuffmanError::parse(start, format!("leaf {} has zero frequency", symbol)));
                }
                if !seen.insert(symbol) {
                    return Err(HuffmanError::parse(start, format!("symbol {} appears twice", symbol)));
                }
                HuffNode::leaf(symbol, weight)
            }
            Some(b) => {
                return Err(HuffmanError::parse(
                    start,
                    format!("expected 'I' or 'L', found {:?}", b as char),
                ))
            }
            None => return Err(HuffmanError::parse(start, "input ended inside the tree")),
        };

        loop {
            match open.pop() {
                None => break 'tokens node,
                Some(None) => {
                    open.push(Some(node));
                    continue 'tokens;
                }
                Some(Some(left)) => {
                    node = HuffNode::merge(left, node)
                        .map_err(|_| HuffmanError::parse(cursor.pos, "frequency sum overflows"))?;
                }
            }
        }
    };

    if cursor.pos != text.len() {
        return Err(HuffmanError::parse(cursor.pos, "trailing data after the tree"));
    }
    HuffmanTree::from_root(root, alphabet).map(Some)
}
