//! Persisted forms of an encoding.
//!
//! [`ImageContainer`] is the binary image file. Fields are written in order
//! with Qt `QDataStream` conventions: big-endian `i32` integers, and strings
//! as a `u32` byte length followed by UTF-16BE code units (`0xFFFF_FFFF`
//! marks a null string). [`TextArchive`] is the plain-text save file: tree
//! text on the first line, the encoded bits on the second.

use std::fmt;
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};

use crate::error::{HuffmanError, Result};

pub const FORMAT_TAG: &str = "HUFF_IMG_V2";

const NULL_STRING: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContainer {
    pub width: i32,
    pub height: i32,
    pub channels: i32,
    /// Tree in the preorder text form.
    pub tree_text: String,
    /// Encoded pixels as `'0'`/`'1'` characters.
    pub bits: String,
}

impl ImageContainer {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_string(writer, FORMAT_TAG)?;
        writer.write_i32::<BigEndian>(self.width)?;
        writer.write_i32::<BigEndian>(self.height)?;
        writer.write_i32::<BigEndian>(self.channels)?;
        write_string(writer, &self.tree_text)?;
        write_string(writer, &self.bits)?;
        Ok(())
    }

    /// Reads a container, rejecting any tag other than [`FORMAT_TAG`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let tag = read_string(reader)?;
        if tag != FORMAT_TAG {
            return Err(HuffmanError::UnsupportedFormatTag(tag));
        }
        let width = reader.read_i32::<BigEndian>()?;
        let height = reader.read_i32::<BigEndian>()?;
        let channels = reader.read_i32::<BigEndian>()?;
        let tree_text = read_string(reader)?;
        let bits = read_string(reader)?;
        Ok(ImageContainer {
            width,
            height,
            channels,
            tree_text,
            bits,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(bytes))
    }
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let byte_len = units
        .len()
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n != NULL_STRING)
        .ok_or_else(|| HuffmanError::Container(format!("string of {} units too long", units.len())))?;
    writer.write_u32::<BigEndian>(byte_len)?;
    for unit in units {
        writer.write_u16::<BigEndian>(unit)?;
    }
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let byte_len = reader.read_u32::<BigEndian>()?;
    if byte_len == NULL_STRING {
        return Ok(String::new());
    }
    if byte_len % 2 != 0 {
        return Err(HuffmanError::Container(format!(
            "odd UTF-16 byte length {}",
            byte_len
        )));
    }
    // take() keeps a corrupt length from allocating more than the input holds
    let mut buf = Vec::new();
    reader.by_ref().take(u64::from(byte_len)).read_to_end(&mut buf)?;
    if buf.len() != byte_len as usize {
        return Err(HuffmanError::Container(format!(
            "string needs {} bytes, only {} remain",
            byte_len,
            buf.len()
        )));
    }
    let units: Vec<u16> = buf.chunks_exact(2).map(BigEndian::read_u16).collect();
    String::from_utf16(&units).map_err(|e| HuffmanError::Container(e.to_string()))
}

/// Two-line text save file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextArchive {
    pub tree_text: String,
    pub bits: String,
}

impl fmt::Display for TextArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tree_text)?;
        writeln!(f, "{}", self.bits)
    }
}

impl FromStr for TextArchive {
    type Err = HuffmanError;

    fn from_str(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let tree_text = lines.next().unwrap_or_default().to_string();
        let bits = lines.next().unwrap_or_default().to_string();
        if lines.any(|line| !line.trim().is_empty()) {
            return Err(HuffmanError::Container(
                "text archive has more than two lines".into(),
            ));
        }
        Ok(TextArchive { tree_text, bits })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> ImageContainer {
        ImageContainer {
            width: 2,
            height: 1,
            channels: 1,
            tree_text: "L255:2.".into(),
            bits: "00".into(),
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes().unwrap();
        // tag: 11 chars as UTF-16BE
        assert_eq!(&bytes[..4], &[0, 0, 0, 22]);
        assert_eq!(&bytes[4..6], &[0, b'H']);
        let dims = &bytes[26..38];
        assert_eq!(dims, &[0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 1]);
        assert_eq!(&bytes[38..42], &[0, 0, 0, 14]);
        assert_eq!(bytes.len(), 4 + 22 + 12 + 4 + 14 + 4 + 4);
    }

    #[test]
    fn test_roundtrip() {
        let container = sample();
        let restored = ImageContainer::from_bytes(&container.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, container);
    }

    #[test]
    fn test_rejects_other_tag() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "HUFF_IMG_V1").unwrap();
        bytes.extend_from_slice(&[0; 12]);
        match ImageContainer::from_bytes(&bytes) {
            Err(HuffmanError::UnsupportedFormatTag(tag)) => assert_eq!(tag, "HUFF_IMG_V1"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_input() {
        let bytes = sample().to_bytes().unwrap();
        assert!(ImageContainer::from_bytes(&bytes[..bytes.len() - 3]).is_err());
        assert!(ImageContainer::from_bytes(&[0xff, 0xff, 0xff, 0xf0]).is_err());
    }

    #[test]
    fn test_null_string_reads_empty() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(NULL_STRING).unwrap();
        assert_eq!(read_string(&mut Cursor::new(bytes)).unwrap(), "");
    }

    #[test]
    fn test_text_archive() {
        let archive = TextArchive {
            tree_text: "IL97:1.L98:1.".into(),
            bits: "01".into(),
        };
        let text = archive.to_string();
        assert_eq!(text, "IL97:1.L98:1.\n01\n");
        assert_eq!(text.parse::<TextArchive>().unwrap(), archive);
        assert_eq!("".parse::<TextArchive>().unwrap(), TextArchive::default());
        assert!("a\nb\nc".parse::<TextArchive>().is_err());
    }
}
