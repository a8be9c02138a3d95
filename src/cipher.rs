//! Symmetric cipher seam for packed payloads.
//!
//! The coder never looks inside ciphertext: a [`ByteCipher`] is applied to
//! the packed bytes after encoding and removed before unpacking.

use crate::error::Result;

pub trait ByteCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

#[cfg(feature = "aes")]
pub use self::aes_ctr::Aes128Ctr;

#[cfg(feature = "aes")]
mod aes_ctr {
    use ctr::cipher::{KeyIvInit, StreamCipher};

    use super::ByteCipher;
    use crate::error::{HuffmanError, Result};

    type Ctr = ctr::Ctr128BE<aes::Aes128>;

    /// AES-128 in counter mode, keystream starting from the 16-byte IV.
    pub struct Aes128Ctr {
        key: [u8; 16],
        iv: [u8; 16],
    }

    impl Aes128Ctr {
        pub const KEY_LEN: usize = 16;
        pub const IV_LEN: usize = 16;

        pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
            let key: [u8; 16] = key.try_into().map_err(|_| {
                HuffmanError::Cipher(format!("key must be {} bytes, got {}", Self::KEY_LEN, key.len()))
            })?;
            let iv: [u8; 16] = iv.try_into().map_err(|_| {
                HuffmanError::Cipher(format!("IV must be {} bytes, got {}", Self::IV_LEN, iv.len()))
            })?;
            Ok(Aes128Ctr { key, iv })
        }

        // each call restarts the keystream at the IV
        fn apply_keystream(&self, data: &[u8]) -> Vec<u8> {
            let mut out = data.to_vec();
            let mut cipher = Ctr::new(&self.key.into(), &self.iv.into());
            cipher.apply_keystream(&mut out);
            out
        }
    }

    impl ByteCipher for Aes128Ctr {
        fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
            Ok(self.apply_keystream(plaintext))
        }

        fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
            Ok(self.apply_keystream(ciphertext))
        }
    }
}
