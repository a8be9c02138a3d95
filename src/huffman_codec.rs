use std::io::{Read, Write};

use log::{debug, warn};

use crate::bit_vec::{pack, PackedBits};
use crate::code_table::CodeTable;
use crate::config::{CodecConfig, DecodePolicy};
use crate::container::{ImageContainer, TextArchive};
use crate::decoder;
use crate::error::{HuffmanError, Result};
use crate::hufftree::{Alphabet, FrequencyTable, HuffmanTree, Symbol};
use crate::predictive;
use crate::tree_text;

/// A tree together with the code table derived from it.
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    tree: Option<HuffmanTree>,
    encode_table: CodeTable,
    config: CodecConfig,
}

impl HuffmanCodec {
    pub fn new(tree: Option<HuffmanTree>, config: CodecConfig) -> Self {
        let encode_table = CodeTable::for_tree(tree.as_ref());
        HuffmanCodec {
            tree,
            encode_table,
            config,
        }
    }

    pub fn from_frequencies(
        frequencies: &FrequencyTable,
        alphabet: Alphabet,
        config: CodecConfig,
    ) -> Result<Self> {
        let tree = HuffmanTree::from_frequencies(frequencies, alphabet)?;
        Ok(Self::new(tree, config))
    }

    /// Rebuilds a codec from persisted tree text.
    pub fn from_tree_text(text: &str, alphabet: Alphabet, config: CodecConfig) -> Result<Self> {
        let tree = tree_text::deserialize(text, alphabet)?;
        Ok(Self::new(tree, config))
    }

    pub fn tree(&self) -> Option<&HuffmanTree> {
        self.tree.as_ref()
    }

    pub fn codes(&self) -> &CodeTable {
        &self.encode_table
    }

    pub fn tree_text(&self) -> String {
        tree_text::serialize(self.tree.as_ref())
    }

    pub fn encode(&self, symbols: &[Symbol]) -> Result<String> {
        self.encode_table.encode(symbols.iter().copied())
    }

    pub fn decode(&self, bits: &str) -> Result<Vec<Symbol>> {
        decoder::decode_with_policy(bits, self.tree.as_ref(), self.config.decode_policy)
    }
}

/// Size before and after coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionStats {
    pub original_bits: u64,
    pub encoded_bits: u64,
}

impl CompressionStats {
    /// `1 - encoded / original`; zero for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_bits == 0 {
            return 0.0;
        }
        1.0 - self.encoded_bits as f64 / self.original_bits as f64
    }

    pub fn reduction_percent(&self) -> f64 {
        self.ratio() * 100.0
    }

    /// Bytes taken by the encoded bits once packed.
    pub fn packed_bytes(&self) -> u64 {
        self.encoded_bits.div_ceil(8)
    }
}

/// One row of the symbol / frequency / code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReport {
    pub symbol: Symbol,
    pub frequency: u64,
    pub code: String,
}

impl SymbolReport {
    /// Display name: printable bytes as characters, deltas as numbers.
    pub fn label(&self, alphabet: Alphabet) -> String {
        match (alphabet, self.symbol) {
            (Alphabet::Bytes, 32) => "Space".to_string(),
            (Alphabet::Bytes, 10) => "\\n".to_string(),
            (Alphabet::Bytes, s) if (s as u8).is_ascii_graphic() => (s as u8 as char).to_string(),
            (_, s) => s.to_string(),
        }
    }
}

/// Rows for every symbol in `frequencies`, ascending by symbol.
pub fn symbol_report(frequencies: &FrequencyTable, codes: &CodeTable) -> Vec<SymbolReport> {
    frequencies
        .iter()
        .map(|(symbol, frequency)| SymbolReport {
            symbol,
            frequency,
            code: codes.get(symbol).unwrap_or_default().to_string(),
        })
        .collect()
}

fn first_mismatch<T: PartialEq>(a: &[T], b: &[T]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then_some(a.len().min(b.len())))
}

#[derive(Debug, Clone)]
pub struct TextEncoding {
    pub tree: Option<HuffmanTree>,
    pub codes: CodeTable,
    pub frequencies: FrequencyTable,
    /// Encoded text as `'0'`/`'1'` characters.
    pub bits: String,
    pub stats: CompressionStats,
}

impl TextEncoding {
    pub fn archive(&self) -> TextArchive {
        TextArchive {
            tree_text: tree_text::serialize(self.tree.as_ref()),
            bits: self.bits.clone(),
        }
    }

    pub fn packed(&self) -> Result<PackedBits> {
        pack(&self.bits)
    }

    pub fn report(&self) -> Vec<SymbolReport> {
        symbol_report(&self.frequencies, &self.codes)
    }
}

/// Huffman coding of raw bytes.
#[derive(Debug, Clone, Default)]
pub struct TextCodec {
    config: CodecConfig,
}

impl TextCodec {
    pub fn new(config: CodecConfig) -> Self {
        TextCodec { config }
    }

    pub fn compress(&self, input: &[u8]) -> Result<TextEncoding> {
        let frequencies = FrequencyTable::from_bytes(input);
        let codec = HuffmanCodec::from_frequencies(&frequencies, Alphabet::Bytes, self.config.clone())?;
        let bits = codec
            .encode_table
            .encode(input.iter().map(|&b| Symbol::from(b)))?;

        let stats = CompressionStats {
            original_bits: input.len() as u64 * 8,
            encoded_bits: bits.len() as u64,
        };
        debug!(
            "text: {} bytes -> {} bits ({:.2}% smaller)",
            input.len(),
            bits.len(),
            stats.reduction_percent()
        );

        if self.config.verify_roundtrip {
            let decoded = self.decompress(codec.tree(), &bits)?;
            if let Some(at) = first_mismatch(input, &decoded[..]) {
                return Err(HuffmanError::RoundtripMismatch(at));
            }
        }

        Ok(TextEncoding {
            tree: codec.tree,
            codes: codec.encode_table,
            frequencies,
            bits,
            stats,
        })
    }

    pub fn decompress(&self, tree: Option<&HuffmanTree>, bits: &str) -> Result<Vec<u8>> {
        let symbols = decoder::decode_with_policy(bits, tree, self.config.decode_policy)?;
        symbols
            .into_iter()
            .map(|symbol| {
                u8::try_from(symbol).map_err(|_| HuffmanError::SymbolOutOfRange {
                    symbol,
                    size: Alphabet::Bytes.size(),
                })
            })
            .collect()
    }

    pub fn decompress_archive(&self, archive: &TextArchive) -> Result<Vec<u8>> {
        let tree = tree_text::deserialize(&archive.tree_text, Alphabet::Bytes)?;
        self.decompress(tree.as_ref(), &archive.bits)
    }

    pub fn decompress_packed(&self, tree: Option<&HuffmanTree>, packed: &PackedBits) -> Result<Vec<u8>> {
        self.decompress(tree, &packed.unpack()?)
    }
}

/// Interleaved 8-bit samples plus their geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl RawImage {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        let expected = sample_count(i64::from(width), i64::from(height), i64::from(channels))?;
        if pixels.len() != expected {
            return Err(HuffmanError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(RawImage {
            pixels,
            width,
            height,
            channels,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.pixels.len()
    }
}

fn sample_count(width: i64, height: i64, channels: i64) -> Result<usize> {
    let invalid = HuffmanError::InvalidDimensions {
        width,
        height,
        channels,
    };
    let in_range = |v: i64| v > 0 && v <= i64::from(i32::MAX);
    if !(in_range(width) && in_range(height) && in_range(channels)) {
        return Err(invalid);
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(invalid)
}

#[derive(Debug, Clone)]
pub struct ImageEncoding {
    pub tree: Option<HuffmanTree>,
    pub codes: CodeTable,
    /// Frequencies of the predictive symbols, not of the raw samples.
    pub frequencies: FrequencyTable,
    pub bits: String,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub stats: CompressionStats,
}

impl ImageEncoding {
    pub fn to_container(&self) -> ImageContainer {
        // dimensions were range-checked when the RawImage was built
        ImageContainer {
            width: self.width as i32,
            height: self.height as i32,
            channels: self.channels as i32,
            tree_text: tree_text::serialize(self.tree.as_ref()),
            bits: self.bits.clone(),
        }
    }

    pub fn report(&self) -> Vec<SymbolReport> {
        symbol_report(&self.frequencies, &self.codes)
    }
}

/// Huffman coding of pixel samples after the predictive delta transform.
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    config: CodecConfig,
}

impl ImageCodec {
    pub fn new(config: CodecConfig) -> Self {
        ImageCodec { config }
    }

    pub fn compress(&self, image: &RawImage) -> Result<ImageEncoding> {
        let expected = sample_count(
            i64::from(image.width),
            i64::from(image.height),
            i64::from(image.channels),
        )?;
        if image.pixels.len() != expected {
            return Err(HuffmanError::PixelCountMismatch {
                expected,
                actual: image.pixels.len(),
            });
        }
        let symbols = predictive::forward(&image.pixels);
        let frequencies = FrequencyTable::from_symbols(symbols.iter().copied());
        let codec =
            HuffmanCodec::from_frequencies(&frequencies, Alphabet::PixelDeltas, self.config.clone())?;
        let bits = codec.encode(&symbols)?;

        let stats = CompressionStats {
            original_bits: image.pixels.len() as u64 * 8,
            encoded_bits: bits.len() as u64,
        };
        debug!(
            "image {}x{}x{}: {} samples -> {} bits ({:.2}% smaller)",
            image.width,
            image.height,
            image.channels,
            image.pixels.len(),
            bits.len(),
            stats.reduction_percent()
        );

        let encoding = ImageEncoding {
            tree: codec.tree,
            codes: codec.encode_table,
            frequencies,
            bits,
            width: image.width,
            height: image.height,
            channels: image.channels,
            stats,
        };

        if self.config.verify_roundtrip {
            let decoded = self.decompress(&encoding.to_container())?;
            if let Some(at) = first_mismatch(&image.pixels[..], &decoded.pixels[..]) {
                return Err(HuffmanError::RoundtripMismatch(at));
            }
        }
        Ok(encoding)
    }

    pub fn decompress(&self, container: &ImageContainer) -> Result<RawImage> {
        let expected = sample_count(
            i64::from(container.width),
            i64::from(container.height),
            i64::from(container.channels),
        )?;
        let tree = tree_text::deserialize(&container.tree_text, Alphabet::PixelDeltas)?;
        let mut symbols =
            decoder::decode_with_policy(&container.bits, tree.as_ref(), self.config.decode_policy)?;

        if symbols.len() != expected {
            match self.config.decode_policy {
                DecodePolicy::Strict => {
                    return Err(HuffmanError::PixelCountMismatch {
                        expected,
                        actual: symbols.len(),
                    })
                }
                DecodePolicy::Lenient => {
                    warn!(
                        "decoded {} samples, image needs {}; {}",
                        symbols.len(),
                        expected,
                        if symbols.len() > expected { "dropping the excess" } else { "repeating the last sample" }
                    );
                    // a zero delta repeats the previous sample
                    symbols.resize(expected, predictive::BIAS as Symbol);
                }
            }
        }

        let pixels = predictive::inverse(&symbols);
        Ok(RawImage {
            pixels,
            width: container.width as u32,
            height: container.height as u32,
            channels: container.channels as u32,
        })
    }

    pub fn write_container<W: Write>(&self, image: &RawImage, writer: &mut W) -> Result<ImageEncoding> {
        let encoding = self.compress(image)?;
        encoding.to_container().write_to(writer)?;
        Ok(encoding)
    }

    pub fn read_container<R: Read>(&self, reader: &mut R) -> Result<RawImage> {
        let container = ImageContainer::read_from(reader)?;
        self.decompress(&container)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_text_scenario() {
        let encoding = TextCodec::default().compress(b"aaabbbbcc").unwrap();
        assert_eq!(encoding.stats.original_bits, 72);
        assert_eq!(encoding.stats.encoded_bits, 14);
        assert!((encoding.stats.reduction_percent() - 80.555).abs() < 0.01);
        assert_eq!(encoding.stats.packed_bytes(), 2);

        let report = encoding.report();
        let rows: Vec<(String, u64, usize)> = report
            .iter()
            .map(|r| (r.label(Alphabet::Bytes), r.frequency, r.code.len()))
            .collect();
        assert_eq!(
            rows,
            vec![("a".into(), 3, 2), ("b".into(), 4, 1), ("c".into(), 2, 2)]
        );
    }

    #[test]
    fn test_text_archive_roundtrip() {
        let codec = TextCodec::new(CodecConfig::new().with_verify_roundtrip(true));
        let input = b"Huffman encoding is a greedy algorithm\nthat builds optimal prefix codes.";
        let encoding = codec.compress(input).unwrap();
        let archive: TextArchive = encoding.archive().to_string().parse().unwrap();
        assert_eq!(codec.decompress_archive(&archive).unwrap(), input.to_vec());

        let packed = encoding.packed().unwrap();
        assert_eq!(
            codec.decompress_packed(encoding.tree.as_ref(), &packed).unwrap(),
            input.to_vec()
        );
    }

    #[test]
    fn test_codec_reload_from_tree_text() {
        let frequencies = FrequencyTable::from_bytes(b"aaabbbbcc");
        let codec =
            HuffmanCodec::from_frequencies(&frequencies, Alphabet::Bytes, CodecConfig::default())
                .unwrap();
        assert_eq!(codec.codes().get(b'b' as Symbol), Some("0"));
        assert_eq!(codec.codes().get(b'c' as Symbol), Some("10"));
        assert_eq!(codec.codes().get(b'a' as Symbol), Some("11"));

        let symbols: Vec<Symbol> = b"abcab".iter().map(|&b| Symbol::from(b)).collect();
        let bits = codec.encode(&symbols).unwrap();

        let reloaded =
            HuffmanCodec::from_tree_text(&codec.tree_text(), Alphabet::Bytes, CodecConfig::default())
                .unwrap();
        assert_eq!(reloaded.tree(), codec.tree());
        assert_eq!(reloaded.codes(), codec.codes());
        assert_eq!(reloaded.decode(&bits).unwrap(), symbols);
    }

    #[test]
    fn test_codec_decode_policy() {
        let tree_text = HuffmanCodec::from_frequencies(
            &FrequencyTable::from_bytes(b"aaabbbbcc"),
            Alphabet::Bytes,
            CodecConfig::default(),
        )
        .unwrap()
        .tree_text();
        // "0" + "11" decode to b, a; the final "1" stops inside the tree
        let bits = "0111";

        let strict = HuffmanCodec::from_tree_text(&tree_text, Alphabet::Bytes, CodecConfig::default())
            .unwrap();
        assert!(matches!(
            strict.decode(bits),
            Err(HuffmanError::DecodeTruncated { decoded: 2, dangling_bits: 1 })
        ));

        let lenient = HuffmanCodec::from_tree_text(
            &tree_text,
            Alphabet::Bytes,
            CodecConfig::new().with_decode_policy(DecodePolicy::Lenient),
        )
        .unwrap();
        assert_eq!(lenient.decode(bits).unwrap(), vec![b'b' as Symbol, b'a' as Symbol]);
    }

    #[test]
    fn test_empty_text() {
        let codec = TextCodec::default();
        let encoding = codec.compress(b"").unwrap();
        assert!(encoding.tree.is_none());
        assert_eq!(encoding.bits, "");
        assert_eq!(encoding.stats.ratio(), 0.0);
        assert_eq!(encoding.archive().to_string(), "\n\n");
        assert!(codec.decompress(None, "").unwrap().is_empty());
    }

    #[test]
    fn test_labels() {
        let row = |symbol| SymbolReport {
            symbol,
            frequency: 1,
            code: "0".into(),
        };
        assert_eq!(row(32).label(Alphabet::Bytes), "Space");
        assert_eq!(row(10).label(Alphabet::Bytes), "\\n");
        assert_eq!(row(7).label(Alphabet::Bytes), "7");
        assert_eq!(row(65).label(Alphabet::PixelDeltas), "65");
    }

    fn gradient(width: u32, height: u32, channels: u32) -> RawImage {
        let pixels = (0..width * height * channels)
            .map(|i| ((i / channels) % 200 + (i % channels) * 20) as u8)
            .collect();
        RawImage::new(pixels, width, height, channels).unwrap()
    }

    #[test]
    fn test_image_roundtrip() {
        let codec = ImageCodec::new(CodecConfig::new().with_verify_roundtrip(true));
        let image = gradient(16, 8, 3);
        let encoding = codec.compress(&image).unwrap();
        assert!(encoding.stats.encoded_bits < encoding.stats.original_bits);

        let container = ImageContainer::from_bytes(&encoding.to_container().to_bytes().unwrap()).unwrap();
        assert_eq!(codec.decompress(&container).unwrap(), image);
    }

    #[test]
    fn test_flat_image_single_symbol() {
        let image = RawImage::new(vec![0; 12], 2, 2, 3).unwrap();
        let encoding = ImageCodec::default().compress(&image).unwrap();
        // every delta is the bias value
        assert_eq!(encoding.tree.as_ref().unwrap().leaf_count(), 1);
        assert_eq!(encoding.bits, "0".repeat(12));
        assert_eq!(ImageCodec::default().decompress(&encoding.to_container()).unwrap(), image);
    }

    #[test]
    fn test_image_length_mismatch() {
        let image = gradient(4, 4, 1);
        let mut container = ImageCodec::default().compress(&image).unwrap().to_container();
        container.height = 5;

        assert!(matches!(
            ImageCodec::default().decompress(&container),
            Err(HuffmanError::PixelCountMismatch { expected: 20, actual: 16 })
        ));

        let lenient = ImageCodec::new(CodecConfig::new().with_decode_policy(DecodePolicy::Lenient));
        let restored = lenient.decompress(&container).unwrap();
        assert_eq!(restored.pixels.len(), 20);
        assert_eq!(&restored.pixels[..16], &image.pixels[..]);
        assert!(restored.pixels[16..].iter().all(|&p| p == image.pixels[15]));
    }

    #[test]
    fn test_invalid_images() {
        assert!(matches!(
            RawImage::new(vec![0; 5], 2, 2, 1),
            Err(HuffmanError::PixelCountMismatch { expected: 4, actual: 5 })
        ));
        assert!(matches!(
            RawImage::new(Vec::new(), 0, 2, 1),
            Err(HuffmanError::InvalidDimensions { .. })
        ));
    }
}
