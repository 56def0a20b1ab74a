//! PNG chunk scanner.

use super::chunk::{is_standard, type_name, PngChunk};
use crate::error::{Result, SqueezeError};
use crate::types::PNG_SIGNATURE;
use std::collections::BTreeMap;

/// Chunks found in a PNG buffer, split into standard chunks (file order)
/// and everything else (keyed by type).
#[derive(Debug, Clone)]
pub struct PngParser {
    standard: Vec<PngChunk>,
    custom: BTreeMap<[u8; 4], PngChunk>,
}

impl PngParser {
    /// Parses every chunk after the signature until the buffer is exhausted.
    ///
    /// A later non-standard chunk replaces an earlier one of the same type.
    /// With `verify_crc`, a chunk whose CRC field disagrees with its contents
    /// is an error.
    pub fn parse(data: &[u8], verify_crc: bool) -> Result<Self> {
        if !data.starts_with(PNG_SIGNATURE) {
            return Err(SqueezeError::FormatNotRecognized);
        }

        let mut standard = Vec::new();
        let mut custom = BTreeMap::new();
        let mut pos = PNG_SIGNATURE.len();

        while pos < data.len() {
            let header = data.get(pos..pos + 8).ok_or(SqueezeError::Truncated {
                what: "chunk header",
                offset: pos,
            })?;
            let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
            let chunk_type = [header[4], header[5], header[6], header[7]];

            let data_start = pos + 8;
            let body = (length as usize)
                .checked_add(data_start + 4)
                .and_then(|end| data.get(data_start..end))
                .ok_or(SqueezeError::Truncated {
                    what: "chunk body",
                    offset: pos,
                })?;
            let (chunk_data, crc) = body.split_at(length as usize);
            let crc = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);

            let chunk = PngChunk {
                length,
                chunk_type,
                data: chunk_data.to_vec(),
                crc,
            };

            if verify_crc && chunk.computed_crc() != crc {
                return Err(SqueezeError::CrcMismatch {
                    chunk_type: type_name(&chunk_type),
                    offset: pos,
                });
            }

            log::trace!("{} chunk at {}, {} bytes", type_name(&chunk_type), pos, length);

            if is_standard(&chunk_type) {
                standard.push(chunk);
            } else if custom.insert(chunk_type, chunk).is_some() {
                log::warn!(
                    "duplicate {} chunk at {} replaces an earlier one",
                    type_name(&chunk_type),
                    pos
                );
            }

            pos = data_start + body.len();
        }

        log::debug!(
            "scanned {} standard and {} custom chunks",
            standard.len(),
            custom.len()
        );

        Ok(Self { standard, custom })
    }

    /// Standard chunks in file order.
    pub fn standard(&self) -> &[PngChunk] {
        &self.standard
    }

    /// Non-standard chunks keyed by type.
    pub fn custom(&self) -> &BTreeMap<[u8; 4], PngChunk> {
        &self.custom
    }

    /// Splits the parser into its standard and custom chunk tables.
    pub fn into_parts(self) -> (Vec<PngChunk>, BTreeMap<[u8; 4], PngChunk>) {
        (self.standard, self.custom)
    }
}
