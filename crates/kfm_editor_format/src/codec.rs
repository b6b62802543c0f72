// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary codec for KFM documents.
//!
//! Layout (little endian):
//! - `;Gamebryo KFM File Version <version>\n`
//! - endianness byte (2.0+)
//! - NIF file name, master name (2.0+), legacy header values (1.2.4 and older)
//! - animation count and animations, each with its transitions
//! - footer integer

use crate::document::{Animation, Document, LegacyHeader, Transition};
use crate::version::KfmVersion;

/// Magic prefix of the header line
pub const HEADER_PREFIX: &str = ";Gamebryo KFM File Version ";

const LITTLE_ENDIAN: u8 = 1;

/// Smallest encoded size of an animation (code, name length, index, count)
const MIN_ANIMATION_SIZE: usize = 16;
/// Encoded size of a transition
const TRANSITION_SIZE: usize = 8;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Header line is missing or malformed
    #[error("Bad header: {0}")]
    BadHeader(String),

    /// Version label could not be parsed
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Only little-endian files are supported
    #[error("Unsupported endianness byte {0}")]
    UnsupportedEndianness(u8),

    /// Input ended before a field was complete
    #[error("Unexpected end of data at offset {offset}")]
    UnexpectedEof {
        /// Offset where the read started
        offset: usize,
    },

    /// A count field cannot fit in the remaining input
    #[error("Count {count} at offset {offset} exceeds remaining data")]
    CountTooLarge {
        /// The decoded count
        count: u32,
        /// Offset of the count field
        offset: usize,
    },

    /// Data continues past the footer
    #[error("{0} trailing bytes after document")]
    TrailingBytes(usize),

    /// A string holds characters outside the single-byte range
    #[error("String cannot be encoded as single-byte text: {0:?}")]
    UnencodableString(String),

    /// A sequence is too long for its 32-bit count field
    #[error("Sequence of {0} elements is too long to encode")]
    SequenceTooLong(usize),
}

/// Codec seam used by the edit engine for persistence and snapshots
pub trait DocumentCodec: Send + Sync {
    /// Decode a full document
    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError>;

    /// Encode a full document
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError>;
}

/// The KFM binary codec
#[derive(Debug, Clone, Copy, Default)]
pub struct KfmCodec;

impl DocumentCodec for KfmCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError> {
        decode(bytes)
    }

    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError> {
        encode(document)
    }
}

/// Decode a document from its binary form
pub fn decode(bytes: &[u8]) -> Result<Document, CodecError> {
    let mut reader = Reader::new(bytes);
    let version = reader.header()?;

    if version.has_endian_byte() {
        let endian = reader.u8()?;
        if endian != LITTLE_ENDIAN {
            return Err(CodecError::UnsupportedEndianness(endian));
        }
    }

    let primary_asset_name = reader.sized_string()?;
    let master = if version.has_endian_byte() {
        reader.sized_string()?
    } else {
        String::new()
    };

    let legacy = if version.is_legacy() {
        LegacyHeader {
            int1: reader.i32()?,
            int2: reader.i32()?,
            float1: reader.f32()?,
            float2: reader.f32()?,
        }
    } else {
        LegacyHeader::default()
    };

    let count = reader.count(MIN_ANIMATION_SIZE)?;
    let mut animations = Vec::with_capacity(count);
    for _ in 0..count {
        animations.push(reader.animation(&version)?);
    }

    let footer = reader.i32()?;

    let remaining = reader.remaining();
    if remaining > 0 {
        return Err(CodecError::TrailingBytes(remaining));
    }

    tracing::trace!(
        version = %version,
        animations = animations.len(),
        "Decoded KFM document"
    );

    Ok(Document {
        version,
        primary_asset_name,
        master,
        legacy,
        animations,
        footer,
    })
}

/// Encode a document into its binary form
pub fn encode(document: &Document) -> Result<Vec<u8>, CodecError> {
    let version = &document.version;
    let mut writer = Writer::default();

    writer.raw(HEADER_PREFIX.as_bytes());
    writer.raw(version.label().as_bytes());
    writer.raw(b"\n");

    if version.has_endian_byte() {
        writer.u8(LITTLE_ENDIAN);
    }

    writer.sized_string(&document.primary_asset_name)?;
    if version.has_endian_byte() {
        writer.sized_string(&document.master)?;
    }

    if version.is_legacy() {
        writer.i32(document.legacy.int1);
        writer.i32(document.legacy.int2);
        writer.f32(document.legacy.float1);
        writer.f32(document.legacy.float2);
    }

    writer.count(document.animations.len())?;
    for animation in &document.animations {
        writer.i32(animation.event_code);
        if version.is_legacy() {
            writer.sized_string(&animation.name)?;
        }
        writer.sized_string(&animation.asset_name)?;
        writer.i32(animation.index);
        writer.count(animation.transitions.len())?;
        for transition in &animation.transitions {
            writer.i32(transition.target_event_code);
            writer.i32(transition.kind);
        }
    }

    writer.i32(document.footer);
    Ok(writer.finish())
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof {
                offset: self.offset,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Read a count and check that `count * min_size` bytes remain
    fn count(&mut self, min_size: usize) -> Result<usize, CodecError> {
        let offset = self.offset;
        let count = self.u32()?;
        let needed = (count as usize).checked_mul(min_size);
        match needed {
            Some(needed) if needed <= self.remaining() => Ok(count as usize),
            _ => Err(CodecError::CountTooLarge { count, offset }),
        }
    }

    fn sized_string(&mut self) -> Result<String, CodecError> {
        let len = self.count(1)?;
        // Latin-1: every byte maps to the char with the same value
        Ok(self.take(len)?.iter().map(|&b| char::from(b)).collect())
    }

    fn header(&mut self) -> Result<KfmVersion, CodecError> {
        let Some(end) = self.bytes.iter().position(|&b| b == b'\n') else {
            return Err(CodecError::BadHeader(
                "header line is not terminated".to_string(),
            ));
        };
        let line = self.take(end + 1)?;
        let line = &line[..end];

        let Some(label) = line.strip_prefix(HEADER_PREFIX.as_bytes()) else {
            return Err(CodecError::BadHeader(
                "missing Gamebryo KFM signature".to_string(),
            ));
        };
        let label = std::str::from_utf8(label)
            .map_err(|_| CodecError::BadHeader("version is not ASCII".to_string()))?;

        KfmVersion::parse(label).ok_or_else(|| CodecError::UnsupportedVersion(label.to_string()))
    }

    fn animation(&mut self, version: &KfmVersion) -> Result<Animation, CodecError> {
        let event_code = self.i32()?;
        let name = if version.is_legacy() {
            self.sized_string()?
        } else {
            String::new()
        };
        let asset_name = self.sized_string()?;
        let index = self.i32()?;

        let count = self.count(TRANSITION_SIZE)?;
        let mut transitions = Vec::with_capacity(count);
        for _ in 0..count {
            let target_event_code = self.i32()?;
            let kind = self.i32()?;
            transitions.push(Transition::new(target_event_code, kind));
        }

        Ok(Animation {
            asset_name,
            event_code,
            index,
            transitions,
            name,
        })
    }
}

#[derive(Default)]
struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u32(&mut self, value: u32) {
        self.raw(&value.to_le_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.raw(&value.to_le_bytes());
    }

    fn f32(&mut self, value: f32) {
        self.raw(&value.to_le_bytes());
    }

    fn count(&mut self, len: usize) -> Result<(), CodecError> {
        let count = u32::try_from(len).map_err(|_| CodecError::SequenceTooLong(len))?;
        self.u32(count);
        Ok(())
    }

    fn sized_string(&mut self, value: &str) -> Result<(), CodecError> {
        let bytes = value
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| CodecError::UnencodableString(value.to_string()))?;
        self.count(bytes.len())?;
        self.raw(&bytes);
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DEFAULT_TRANSITION_KIND;

    fn sample() -> Document {
        let mut doc = Document::new("actor.nif")
            .with_animation(
                Animation::new("idle.kf", 5).with_transition(6, DEFAULT_TRANSITION_KIND),
            )
            .with_animation(Animation::new("walk.kf", 6).with_transition(5, 2));
        doc.master = "actor".to_string();
        doc.animations[1].index = 3;
        doc
    }

    #[test]
    fn test_round_trip_latest() {
        let doc = sample();
        let bytes = encode(&doc).unwrap();
        assert!(bytes.starts_with(b";Gamebryo KFM File Version 2.2.0.0b\n\x01"));
        assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_round_trip_legacy_version() {
        let mut doc = sample();
        doc.version = KfmVersion::parse("1.2.4b").unwrap();
        doc.master = String::new();
        doc.legacy = LegacyHeader {
            int1: 7,
            int2: -1,
            float1: 0.5,
            float2: 2.0,
        };
        doc.animations[0].name = "Idle".to_string();

        let bytes = encode(&doc).unwrap();
        assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let doc = sample();
        assert_eq!(encode(&doc).unwrap(), encode(&doc.clone()).unwrap());
    }

    #[test]
    fn test_latin1_names_survive() {
        let mut doc = sample();
        doc.primary_asset_name = "caf\u{e9}.nif".to_string();
        let decoded = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(decoded.primary_asset_name, "caf\u{e9}.nif");
    }

    #[test]
    fn test_encode_rejects_wide_chars() {
        let mut doc = sample();
        doc.animations[0].asset_name = "\u{263a}.kf".to_string();
        assert!(matches!(
            encode(&doc),
            Err(CodecError::UnencodableString(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_header() {
        assert!(matches!(
            decode(b"not a kfm file\n"),
            Err(CodecError::BadHeader(_))
        ));
        assert!(matches!(decode(b";Gamebryo"), Err(CodecError::BadHeader(_))));
        assert!(matches!(
            decode(b";Gamebryo KFM File Version banana\n"),
            Err(CodecError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_and_trailing() {
        let bytes = encode(&sample()).unwrap();

        let truncated = &bytes[..bytes.len() - 2];
        assert!(matches!(
            decode(truncated),
            Err(CodecError::UnexpectedEof { .. })
        ));

        let mut extended = bytes.clone();
        extended.extend_from_slice(&[0, 0]);
        assert_eq!(decode(&extended), Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn test_decode_rejects_oversized_count() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b";Gamebryo KFM File Version 2.2.0.0b\n\x01");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::CountTooLarge { count: u32::MAX, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_big_endian() {
        let mut bytes = encode(&sample()).unwrap();
        let flag = HEADER_PREFIX.len() + "2.2.0.0b\n".len();
        bytes[flag] = 0;
        assert_eq!(decode(&bytes), Err(CodecError::UnsupportedEndianness(0)));
    }
}
