use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, trace};

use crate::error::{HuffmanError, Result};
use crate::min_heap::{MinHeap, Weighted};

/// A coded symbol: a raw byte, or a biased pixel delta.
pub type Symbol = u16;

/// The symbol range a tree is built over. It also sizes the builder's heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// Raw bytes, 0..=255.
    Bytes,
    /// Predictive pixel deltas, 0..=510.
    PixelDeltas,
}

impl Alphabet {
    pub const fn size(self) -> usize {
        match self {
            Alphabet::Bytes => 256,
            Alphabet::PixelDeltas => 511,
        }
    }

    pub fn contains(self, symbol: Symbol) -> bool {
        (symbol as usize) < self.size()
    }

    pub fn check(self, symbol: Symbol) -> Result<()> {
        if self.contains(symbol) {
            Ok(())
        } else {
            Err(HuffmanError::SymbolOutOfRange {
                symbol,
                size: self.size(),
            })
        }
    }
}

/// Occurrence counts per symbol. Only positive counts are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Symbol, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_symbols(bytes.iter().map(|&b| Symbol::from(b)))
    }

    pub fn from_symbols<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        symbols
            .into_iter()
            .fold(FrequencyTable::new(), |mut acc, symbol| {
                acc.add(symbol, 1);
                acc
            })
    }

    /// Adds `count` occurrences of `symbol`, saturating at `u64::MAX`.
    pub fn add(&mut self, symbol: Symbol, count: u64) {
        if count > 0 {
            let slot = self.counts.entry(symbol).or_insert(0);
            *slot = slot.saturating_add(count);
        }
    }

    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the input length the table was built from.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0, |acc, &c| acc.saturating_add(c))
    }

    /// `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}

impl FromIterator<(Symbol, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, u64)>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for (symbol, count) in iter {
            table.add(symbol, count);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: Symbol,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: Symbol, weight: u64) -> Self {
        HuffNode::Leaf { symbol, weight }
    }

    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Internal { weight, .. } => *weight,
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            HuffNode::Leaf { symbol, .. } => Some(*symbol),
            HuffNode::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    /// Joins two subtrees under a new parent; fails if the weights overflow.
    pub fn merge(a: Self, b: Self) -> Result<Self> {
        // a is the smaller node and goes left
        let weight = a
            .weight()
            .checked_add(b.weight())
            .ok_or(HuffmanError::WeightOverflow {
                left: a.weight(),
                right: b.weight(),
            })?;
        Ok(HuffNode::Internal {
            weight,
            left: Box::new(a),
            right: Box::new(b),
        })
    }
}

impl Weighted for HuffNode {
    fn weight(&self) -> u64 {
        HuffNode::weight(self)
    }
}

/// A built Huffman tree. An empty input has no tree at all, so every
/// `HuffmanTree` holds at least one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
    alphabet: Alphabet,
}

impl HuffmanTree {
    /// Builds the tree for `frequencies`. Returns `None` for an empty table.
    pub fn from_frequencies(
        frequencies: &FrequencyTable,
        alphabet: Alphabet,
    ) -> Result<Option<Self>> {
        let tree = TreeBuilder::new(frequencies, alphabet)?.finish()?;
        if let Some(tree) = &tree {
            debug!(
                "built {:?} tree: {} leaves, depth {}, weight {}",
                alphabet,
                tree.leaf_count(),
                tree.depth(),
                tree.root.weight()
            );
        }
        Ok(tree)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Option<Self>> {
        Self::from_frequencies(&FrequencyTable::from_bytes(bytes), Alphabet::Bytes)
    }

    /// Wraps an existing node hierarchy after checking it is a well-formed tree.
    pub fn from_root(root: HuffNode, alphabet: Alphabet) -> Result<Self> {
        let tree = HuffmanTree { root, alphabet };
        tree.validate()?;
        Ok(tree)
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn total_weight(&self) -> u64 {
        self.root.weight()
    }

    /// Preorder walk with the depth of each node.
    fn walk(&self) -> impl Iterator<Item = (&HuffNode, usize)> {
        let mut stack = vec![(&self.root, 0usize)];
        std::iter::from_fn(move || {
            let (node, depth) = stack.pop()?;
            if let HuffNode::Internal { left, right, .. } = node {
                stack.push((right.as_ref(), depth + 1));
                stack.push((left.as_ref(), depth + 1));
            }
            Some((node, depth))
        })
    }

    /// `(symbol, weight)` for every leaf, left to right.
    pub fn leaves(&self) -> Vec<(Symbol, u64)> {
        self.walk()
            .filter_map(|(node, _)| match node {
                HuffNode::Leaf { symbol, weight } => Some((*symbol, *weight)),
                HuffNode::Internal { .. } => None,
            })
            .collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.walk().filter(|(node, _)| node.is_leaf()).count()
    }

    pub fn depth(&self) -> usize {
        self.walk().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    pub fn frequencies(&self) -> FrequencyTable {
        self.leaves().into_iter().collect()
    }

    /// Checks weight conservation, positive leaf weights, symbol range and
    /// that no symbol appears twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (node, _) in self.walk() {
            match node {
                HuffNode::Leaf { symbol, weight } => {
                    self.alphabet.check(*symbol)?;
                    if *weight == 0 {
                        return Err(HuffmanError::DecodeInvalidTree(format!(
                            "leaf {} has zero weight",
                            symbol
                        )));
                    }
                    if !seen.insert(*symbol) {
                        return Err(HuffmanError::DecodeInvalidTree(format!(
                            "symbol {} appears in more than one leaf",
                            symbol
                        )));
                    }
                }
                HuffNode::Internal {
                    weight,
                    left,
                    right,
                } => {
                    let sum = left.weight().checked_add(right.weight());
                    if sum != Some(*weight) {
                        return Err(HuffmanError::DecodeInvalidTree(format!(
                            "internal weight {} does not equal its children's sum",
                            weight
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(&self.root, 0usize, "root")];
        while let Some((node, depth, label)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match node {
                HuffNode::Leaf { symbol, weight } => {
                    writeln!(f, "{}{}-> Leaf: {} [weight: {}]", indent, label, symbol, weight)?;
                }
                HuffNode::Internal {
                    weight,
                    left,
                    right,
                } => {
                    writeln!(f, "{}{}-> Internal [weight: {}]", indent, label, weight)?;
                    stack.push((right.as_ref(), depth + 1, "R"));
                    stack.push((left.as_ref(), depth + 1, "L"));
                }
            }
        }
        Ok(())
    }
}

/// One merge performed by [`TreeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStep {
    pub left_weight: u64,
    pub right_weight: u64,
    pub merged_weight: u64,
    /// Subtrees left in the forest after this merge.
    pub remaining: usize,
}

/// Greedy Huffman construction, one merge at a time.
///
/// Iterating yields a [`MergeStep`] per merge so a visualizer can follow the
/// forest shrinking; [`TreeBuilder::finish`] runs the remaining merges and
/// hands back the tree. Both paths produce the same tree.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    heap: MinHeap<HuffNode>,
    alphabet: Alphabet,
}

impl TreeBuilder {
    pub fn new(frequencies: &FrequencyTable, alphabet: Alphabet) -> Result<Self> {
        let mut heap = MinHeap::with_capacity(alphabet.size());
        for (symbol, count) in frequencies.iter() {
            alphabet.check(symbol)?;
            heap.push(HuffNode::leaf(symbol, count))?;
        }
        Ok(TreeBuilder { heap, alphabet })
    }

    pub fn forest_size(&self) -> usize {
        self.heap.heap_size()
    }

    /// Root weights of the current forest, ascending.
    pub fn forest_weights(&self) -> Vec<u64> {
        let mut weights: Vec<u64> = self.heap.iter().map(HuffNode::weight).collect();
        weights.sort_unstable();
        weights
    }

    pub fn is_done(&self) -> bool {
        self.heap.heap_size() <= 1
    }

    pub fn step(&mut self) -> Result<Option<MergeStep>> {
        if self.is_done() {
            return Ok(None);
        }
        let x = self.heap.pop()?;
        let y = self.heap.pop()?;
        let (left_weight, right_weight) = (x.weight(), y.weight());
        let merged = HuffNode::merge(x, y)?;
        let step = MergeStep {
            left_weight,
            right_weight,
            merged_weight: merged.weight(),
            remaining: self.heap.heap_size() + 1,
        };
        self.heap.push(merged)?;
        trace!(
            "merged {} + {} -> {} ({} left)",
            step.left_weight,
            step.right_weight,
            step.merged_weight,
            step.remaining
        );
        Ok(Some(step))
    }

    pub fn finish(mut self) -> Result<Option<HuffmanTree>> {
        while self.step()?.is_some() {}
        if self.heap.is_empty() {
            return Ok(None);
        }
        let root = self.heap.pop()?;
        Ok(Some(HuffmanTree {
            root,
            alphabet: self.alphabet,
        }))
    }
}

impl Iterator for TreeBuilder {
    type Item = Result<MergeStep>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step().transpose()
    }
}
