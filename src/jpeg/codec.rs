//! JPEG payload codec.
//!
//! Holds the source buffer and its APPn segment table between scanning and
//! saving.

use super::parser::{Fragment, JpegParser, APP_SEGMENT_COUNT};
use super::writer::{split_payload, JpegWriter};
use crate::error::{Result, SqueezeError};
use crate::framing::{FragmentHeader, IdentifierHeader};
use crate::types::{CodecOptions, JPEG_SIGNATURE};
use std::collections::BTreeMap;
use std::io::Write;
use std::ops::Range;

/// APPn segment numbers not conventionally claimed by JFIF, Exif, ICC,
/// Adobe or similar metadata.
pub const FREE_SEGMENTS: [u8; 9] = [4, 5, 6, 7, 8, 9, 10, 11, 15];

/// A JPEG file opened for payload reads and writes.
#[derive(Debug, Clone)]
pub struct JpegCodec {
    source: Vec<u8>,
    segments: BTreeMap<u8, Vec<Fragment>>,
    region: Range<usize>,
    options: CodecOptions,
}

impl JpegCodec {
    /// Scans `source` with default options.
    pub fn new(source: Vec<u8>) -> Result<Self> {
        Self::with_options(source, CodecOptions::default())
    }

    /// Scans `source`, which must start with SOI.
    pub fn with_options(source: Vec<u8>, options: CodecOptions) -> Result<Self> {
        if !source.starts_with(JPEG_SIGNATURE) {
            return Err(SqueezeError::FormatNotRecognized);
        }

        let (segments, region) = JpegParser::parse(&source, options.scan_mode)?.into_parts();

        Ok(Self {
            source,
            segments,
            region,
            options,
        })
    }

    /// Reads the payload stored under `segment`, using the configured
    /// fragment framing.
    pub fn read(&self, segment: u8, identifier: &str) -> Result<Option<Vec<u8>>> {
        self.read_with(segment, identifier, self.options.multi_fragment)
    }

    /// Reads the payload stored under `segment`.
    ///
    /// Returns `Ok(None)` when the segment is absent. Every stored fragment
    /// must start with `identifier`. Without `multi_fragment` only the first
    /// fragment's payload is returned; with it, fragments are reassembled in
    /// the order of their stored index.
    pub fn read_with(
        &self,
        segment: u8,
        identifier: &str,
        multi_fragment: bool,
    ) -> Result<Option<Vec<u8>>> {
        let Some(fragments) = self.segments.get(&segment) else {
            return Ok(None);
        };

        let header = IdentifierHeader::for_lookup(identifier)?;
        let bodies = fragments
            .iter()
            .map(|fragment| header.strip(fragment.body()))
            .collect::<Result<Vec<_>>>()?;

        if !multi_fragment {
            return Ok(Some(bodies.first().map(|body| body.to_vec()).unwrap_or_default()));
        }

        let mut pieces = bodies
            .into_iter()
            .enumerate()
            .map(|(fragment, body)| {
                FragmentHeader::split(body)
                    .ok_or(SqueezeError::TruncatedFragment { segment, fragment })
            })
            .collect::<Result<Vec<_>>>()?;

        pieces.sort_by_key(|(fragment, _)| fragment.index);

        if self.options.strict_fragments {
            check_complete(&pieces)?;
        }

        log::debug!(
            "read APP{} {:?}: {} fragment(s)",
            segment,
            identifier,
            pieces.len()
        );

        Ok(Some(pieces.into_iter().flat_map(|(_, payload)| payload).copied().collect()))
    }

    /// Stores `data` under `segment`, using the configured fragment framing.
    pub fn write(&mut self, segment: u8, identifier: &str, data: &[u8]) -> Result<()> {
        self.write_with(segment, identifier, data, self.options.multi_fragment)
    }

    /// Stores `data` under `segment`, replacing whatever the segment held
    /// before, whatever its identifier.
    pub fn write_with(
        &mut self,
        segment: u8,
        identifier: &str,
        data: &[u8],
        multi_fragment: bool,
    ) -> Result<()> {
        if segment >= APP_SEGMENT_COUNT {
            return Err(SqueezeError::InvalidSegmentNumber(segment));
        }
        if !FREE_SEGMENTS.contains(&segment) {
            return Err(SqueezeError::ReservedSegment(segment));
        }

        let header = IdentifierHeader::new(identifier)?;
        let fragments = split_payload(&header, data, multi_fragment)?;

        log::debug!(
            "write APP{} {:?}: {} bytes in {} fragment(s)",
            segment,
            identifier,
            data.len(),
            fragments.len()
        );

        self.segments.insert(segment, fragments);
        Ok(())
    }

    /// Serializes the segment table back into a complete file.
    pub fn save(self) -> Vec<u8> {
        JpegWriter::new(&self.source, self.region).write(&self.segments)
    }

    /// Serializes into `sink`.
    pub fn save_to<W: Write>(self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.save())?;
        Ok(())
    }

    /// Segment numbers currently held, ascending.
    pub fn segment_numbers(&self) -> impl Iterator<Item = u8> + '_ {
        self.segments.keys().copied()
    }

    /// Fragments held for `segment`.
    pub fn fragments(&self, segment: u8) -> Option<&[Fragment]> {
        self.segments.get(&segment).map(Vec::as_slice)
    }

    /// Byte range of the source replaced on save.
    pub fn region(&self) -> Range<usize> {
        self.region.clone()
    }

    /// Options this codec was opened with.
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Checks that sorted fragments cover `0..total` exactly once.
fn check_complete(pieces: &[(FragmentHeader, &[u8])]) -> Result<()> {
    let Some((first, _)) = pieces.first() else {
        return Ok(());
    };

    let expected = first.declared_total();
    let contiguous = pieces
        .iter()
        .enumerate()
        .all(|(i, (fragment, _))| fragment.index as usize == i);

    if pieces.len() != expected || !contiguous {
        return Err(SqueezeError::IncompleteFragments {
            expected,
            found: pieces.len(),
        });
    }

    Ok(())
}
