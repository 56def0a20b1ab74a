//! PNG chunk model.

use crate::error::{Result, SqueezeError};
use std::fmt;
use std::str::FromStr;

/// Largest chunk data length PNG allows (2^31 - 1).
pub const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

/// Chunk types defined by the PNG, APNG and related registered extensions.
pub const STANDARD_CHUNK_TYPES: [&[u8; 4]; 25] = [
    b"IHDR", b"PLTE", b"IDAT", b"IEND", b"cHRM", b"cICP", b"gAMA", b"iCCP", b"mDCV", b"cLLI",
    b"sBIT", b"sRGB", b"bKGD", b"hIST", b"tRNS", b"eXIf", b"pHYs", b"sPLT", b"tIME", b"iTXt",
    b"tEXt", b"zTXt", b"acTL", b"fcTL", b"fdAT",
];

/// True if `chunk_type` is one of [`STANDARD_CHUNK_TYPES`].
pub fn is_standard(chunk_type: &[u8; 4]) -> bool {
    STANDARD_CHUNK_TYPES.contains(&chunk_type)
}

/// CRC-32 as used by PNG (ISO 3309, reflected polynomial 0xEDB88320),
/// computed over the concatenation of `parts`.
pub fn crc32(parts: &[&[u8]]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;

    for &byte in parts.iter().flat_map(|part| part.iter()) {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }

    crc ^ 0xFFFF_FFFF
}

/// A private ancillary chunk type that payloads may be written to.
///
/// Exactly four ASCII letters, lowercase first letter, not a standard name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkType([u8; 4]);

impl ChunkType {
    /// Validates `name` as a custom chunk type.
    pub fn custom(name: &str) -> Result<Self> {
        let invalid = |reason: &str| SqueezeError::InvalidChunkType(name.to_string(), reason.to_string());

        let bytes: [u8; 4] = name
            .as_bytes()
            .try_into()
            .map_err(|_| invalid("must be exactly 4 characters"))?;

        if !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(invalid("must be ASCII letters"));
        }
        if is_standard(&bytes) {
            return Err(invalid("reserved by the PNG standard"));
        }
        if !bytes[0].is_ascii_lowercase() {
            return Err(invalid("first letter must be lowercase"));
        }

        Ok(Self(bytes))
    }

    /// The four type bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl FromStr for ChunkType {
    type Err = SqueezeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::custom(s)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&type_name(&self.0))
    }
}

/// Printable form of a raw chunk type.
pub fn type_name(chunk_type: &[u8; 4]) -> String {
    String::from_utf8_lossy(chunk_type).into_owned()
}

/// One PNG chunk as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngChunk {
    /// Data length field
    pub length: u32,
    /// Four type bytes
    pub chunk_type: [u8; 4],
    /// Chunk data
    pub data: Vec<u8>,
    /// CRC field over type and data
    pub crc: u32,
}

impl PngChunk {
    /// Builds a chunk, filling in length and CRC.
    ///
    /// `data` must not exceed [`MAX_CHUNK_LEN`].
    pub fn new(chunk_type: [u8; 4], data: Vec<u8>) -> Self {
        let crc = crc32(&[chunk_type.as_slice(), data.as_slice()]);
        Self {
            length: data.len() as u32,
            chunk_type,
            data,
            crc,
        }
    }

    /// CRC computed from the current type and data.
    pub fn computed_crc(&self) -> u32 {
        crc32(&[self.chunk_type.as_slice(), self.data.as_slice()])
    }

    /// Size on disk: length, type, data and CRC.
    pub fn encoded_len(&self) -> usize {
        12 + self.data.len()
    }

    /// Appends the on-disk form to `output`, reusing the stored length and
    /// CRC fields.
    pub fn encode_into(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.length.to_be_bytes());
        output.extend_from_slice(&self.chunk_type);
        output.extend_from_slice(&self.data);
        output.extend_from_slice(&self.crc.to_be_bytes());
    }
}
