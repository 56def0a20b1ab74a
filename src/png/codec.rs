//! PNG payload codec.

use super::chunk::{type_name, ChunkType, PngChunk, MAX_CHUNK_LEN};
use super::parser::PngParser;
use super::writer::PngWriter;
use crate::error::{Result, SqueezeError};
use crate::framing::IdentifierHeader;
use crate::types::CodecOptions;
use std::collections::BTreeMap;
use std::io::Write;

/// A PNG file opened for payload reads and writes.
#[derive(Debug, Clone)]
pub struct PngCodec {
    standard: Vec<PngChunk>,
    custom: BTreeMap<[u8; 4], PngChunk>,
    options: CodecOptions,
}

impl PngCodec {
    /// Scans `source` with default options.
    pub fn new(source: Vec<u8>) -> Result<Self> {
        Self::with_options(source, CodecOptions::default())
    }

    /// Scans `source`, which must start with the PNG signature.
    pub fn with_options(source: Vec<u8>, options: CodecOptions) -> Result<Self> {
        let (standard, custom) = PngParser::parse(&source, options.verify_crc)?.into_parts();
        Ok(Self {
            standard,
            custom,
            options,
        })
    }

    /// Reads the payload stored in the `chunk_type` chunk.
    pub fn read(&self, chunk_type: &str, identifier: &str) -> Result<Vec<u8>> {
        let chunk_type = ChunkType::custom(chunk_type)?;
        let chunk = self
            .custom
            .get(chunk_type.as_bytes())
            .ok_or_else(|| SqueezeError::NotFound(chunk_type.to_string()))?;

        let header = IdentifierHeader::for_lookup(identifier)?;
        if header.is_empty() {
            return Err(SqueezeError::IdentifierMismatch(String::new()));
        }

        let payload = header.strip(&chunk.data)?;
        log::debug!("read {} {:?}: {} bytes", chunk_type, identifier, payload.len());
        Ok(payload.to_vec())
    }

    /// Stores `data` in a `chunk_type` chunk, replacing any chunk of that
    /// type whatever its identifier.
    pub fn write(&mut self, chunk_type: &str, identifier: &str, data: &[u8]) -> Result<()> {
        let chunk_type = ChunkType::custom(chunk_type)?;

        let header = IdentifierHeader::new(identifier)?;
        if header.is_empty() {
            return Err(SqueezeError::InvalidIdentifier(
                String::new(),
                "must not be empty".to_string(),
            ));
        }

        let max = MAX_CHUNK_LEN.saturating_sub(header.len());
        if data.len() > max {
            return Err(SqueezeError::PayloadTooLarge {
                size: data.len(),
                max,
            });
        }

        let chunk = PngChunk::new(*chunk_type.as_bytes(), header.frame(data));
        log::debug!(
            "write {} {:?}: {} bytes, crc {:08x}",
            chunk_type,
            identifier,
            data.len(),
            chunk.crc
        );

        self.custom.insert(*chunk_type.as_bytes(), chunk);
        Ok(())
    }

    /// Serializes the chunk table back into a complete file.
    pub fn save(self) -> Vec<u8> {
        PngWriter::new(&self.standard, &self.custom).write()
    }

    /// Serializes into `sink`.
    pub fn save_to<W: Write>(self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.save())?;
        Ok(())
    }

    /// Types of the standard chunks, in file order.
    pub fn standard_chunk_types(&self) -> Vec<String> {
        self.standard.iter().map(|c| type_name(&c.chunk_type)).collect()
    }

    /// Types of the non-standard chunks, ascending.
    pub fn custom_chunk_types(&self) -> Vec<String> {
        self.custom.keys().map(type_name).collect()
    }

    /// Options this codec was opened with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}
