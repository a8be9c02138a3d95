use crate::cipher::ByteCipher;
use crate::error::{HuffmanError, Result};

/// MSB-first bit buffer.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BitVec {
    bits: Vec<u8>,
    bit_count: usize,
}

impl BitVec {
    pub fn new() -> Self {
        BitVec {
            bits: Vec::new(),
            bit_count: 0,
        }
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    pub fn push_bit(&mut self, bit: bool) {
        let byte_index = self.bit_count / 8; // which byte is target?
        let bit_offset = self.bit_count % 8; // which bit position is target?

        // make a new byte if needed
        if byte_index >= self.bits.len() {
            self.bits.push(0);
        }

        if bit {
            self.bits[byte_index] |= 1 << (7 - bit_offset);
        }

        self.bit_count += 1;
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.bit_count {
            return None;
        }
        Some(self.bits[index / 8] & (1 << (7 - index % 8)) != 0)
    }

    pub fn into_packed(self) -> PackedBits {
        PackedBits {
            bytes: self.bits,
            bit_len: self.bit_count,
        }
    }
}

/// Packed bytes plus the number of meaningful bits.
///
/// The final byte is zero-padded on the right, so the length is needed to
/// tell padding from encoded zero bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedBits {
    pub bytes: Vec<u8>,
    pub bit_len: usize,
}

impl PackedBits {
    /// Encrypts the packed bytes. The bit length is left untouched.
    pub fn seal<C: ByteCipher + ?Sized>(&self, cipher: &C) -> Result<PackedBits> {
        Ok(PackedBits {
            bytes: cipher.encrypt(&self.bytes)?,
            bit_len: self.bit_len,
        })
    }

    pub fn open<C: ByteCipher + ?Sized>(&self, cipher: &C) -> Result<PackedBits> {
        Ok(PackedBits {
            bytes: cipher.decrypt(&self.bytes)?,
            bit_len: self.bit_len,
        })
    }

    pub fn unpack(&self) -> Result<String> {
        unpack(&self.bytes, self.bit_len)
    }
}

/// Packs a `'0'`/`'1'` string into bytes, most significant bit first.
pub fn pack(bits: &str) -> Result<PackedBits> {
    let mut bit_vec = BitVec::new();
    for (index, found) in bits.chars().enumerate() {
        match found {
            '0' => bit_vec.push_bit(false),
            '1' => bit_vec.push_bit(true),
            _ => return Err(HuffmanError::InvalidBit { index, found }),
        }
    }
    Ok(bit_vec.into_packed())
}

/// Expands `bytes` back into a `'0'`/`'1'` string of exactly `bit_len` bits.
pub fn unpack(bytes: &[u8], bit_len: usize) -> Result<String> {
    let available = bytes.len().saturating_mul(8);
    if bit_len > available {
        return Err(HuffmanError::BitLengthOverflow { bit_len, available });
    }
    let bit_vec = BitVec {
        bits: bytes.to_vec(),
        bit_count: bit_len,
    };
    Ok((0..bit_len)
        .map(|i| if bit_vec.get(i) == Some(true) { '1' } else { '0' })
        .collect())
}
