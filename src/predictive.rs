//! Left-neighbour delta filter for pixel streams.
//!
//! Each sample is replaced by its difference from the previous sample plus a
//! bias of 255, so the output lies in 0..=510 and clusters around 255 for
//! smooth images. The first sample is taken relative to 0.

use log::warn;

use crate::hufftree::Symbol;

pub const BIAS: i32 = 255;

pub fn forward(bytes: &[u8]) -> Vec<Symbol> {
    let mut prev = 0i32;
    bytes
        .iter()
        .map(|&b| {
            let cur = i32::from(b);
            let symbol = cur - prev + BIAS;
            prev = cur;
            symbol as Symbol
        })
        .collect()
}

/// Output of [`inverse_with_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub bytes: Vec<u8>,
    /// Samples that fell outside 0..=255 and were clamped.
    pub clamped: usize,
}

/// Undoes [`forward`], clamping each reconstructed sample into 0..=255.
///
/// Valid input never needs clamping. A non-zero `clamped` count means the
/// symbols were corrupted upstream; the clamp hides that from the pixels.
pub fn inverse_with_report(symbols: &[Symbol]) -> Reconstruction {
    let mut bytes = Vec::with_capacity(symbols.len());
    let mut clamped = 0;
    let mut prev = 0i32;
    for &symbol in symbols {
        let val = i32::from(symbol) - BIAS + prev;
        let byte = val.clamp(0, 255);
        if byte != val {
            clamped += 1;
        }
        bytes.push(byte as u8);
        prev = byte;
    }
    if clamped > 0 {
        warn!(
            "clamped {} of {} reconstructed samples; input symbols are inconsistent",
            clamped,
            symbols.len()
        );
    }
    Reconstruction { bytes, clamped }
}

pub fn inverse(symbols: &[Symbol]) -> Vec<u8> {
    inverse_with_report(symbols).bytes
}
