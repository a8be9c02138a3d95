use std::collections::BTreeMap;

use crate::error::{HuffmanError, Result};
use crate::hufftree::{FrequencyTable, HuffNode, HuffmanTree, Symbol};

/// Symbol to bit-code mapping derived from one tree.
///
/// Codes are strings of `'0'`/`'1'`: left edges contribute `'0'`, right edges
/// `'1'`. A tree with a single leaf gives that leaf the code `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<Symbol, String>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();

        if let HuffNode::Leaf { symbol, .. } = tree.root() {
            codes.insert(*symbol, "0".to_string());
            return CodeTable { codes };
        }

        let mut stack = vec![(tree.root(), String::new())];
        while let Some((node, path)) = stack.pop() {
            match node {
                HuffNode::Leaf { symbol, .. } => {
                    codes.insert(*symbol, path);
                }
                HuffNode::Internal { left, right, .. } => {
                    let mut right_path = path.clone();
                    right_path.push('1');
                    let mut left_path = path;
                    left_path.push('0');
                    stack.push((right.as_ref(), right_path));
                    stack.push((left.as_ref(), left_path));
                }
            }
        }
        CodeTable { codes }
    }

    /// Table for an optional tree; no tree means no codes.
    pub fn for_tree(tree: Option<&HuffmanTree>) -> Self {
        tree.map(Self::from_tree).unwrap_or_default()
    }

    pub fn get(&self, symbol: Symbol) -> Option<&str> {
        self.codes.get(&symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `(symbol, code)` in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.codes.iter().map(|(&s, c)| (s, c.as_str()))
    }

    /// Concatenates the code of every symbol in input order.
    pub fn encode<I>(&self, symbols: I) -> Result<String>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut bits = String::new();
        for symbol in symbols {
            let code = self
                .get(symbol)
                .ok_or(HuffmanError::SymbolNotInTable(symbol))?;
            bits.push_str(code);
        }
        Ok(bits)
    }

    /// Number of bits `encode` would produce for the given frequencies.
    pub fn encoded_len(&self, frequencies: &FrequencyTable) -> u64 {
        frequencies
            .iter()
            .filter_map(|(symbol, count)| {
                self.get(symbol)
                    .map(|c| (c.len() as u64).saturating_mul(count))
            })
            .fold(0, u64::saturating_add)
    }
}

/// Builds the table from `tree` and encodes `symbols` with it.
pub fn encode<I>(symbols: I, tree: Option<&HuffmanTree>) -> Result<String>
where
    I: IntoIterator<Item = Symbol>,
{
    CodeTable::for_tree(tree).encode(symbols)
}
