/// How the codec treats a bit-string that ends part way through a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Keep the symbols decoded so far and log the truncation.
    Lenient,
    /// Fail with `DecodeTruncated`.
    #[default]
    Strict,
}

/// Settings for [`TextCodec`](crate::TextCodec) and [`ImageCodec`](crate::ImageCodec).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodecConfig {
    pub decode_policy: DecodePolicy,
    /// Decode every encoding straight away and fail if it does not reproduce the input.
    pub verify_roundtrip: bool,
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn with_verify_roundtrip(mut self, verify: bool) -> Self {
        self.verify_roundtrip = verify;
        self
    }
}
