//! JPEG APPn segment writer.
//!
//! Builds fragments for a payload and splices a segment table back into the
//! original buffer.

use super::parser::{app_marker, Fragment, LENGTH_FIELD_LEN, MARKER_PREFIX};
use crate::error::{Result, SqueezeError};
use crate::framing::{FragmentHeader, IdentifierHeader};
use std::collections::BTreeMap;
use std::ops::Range;

/// Byte budget a fragment's capacity is derived from.
const SEGMENT_BUDGET: usize = 63535;

/// Most fragments one payload can be split into.
pub const MAX_FRAGMENTS: usize = 256;

/// Payload bytes one fragment carries for an identifier header of
/// `header_len` bytes, or `None` if the header alone exhausts the budget.
pub fn fragment_capacity(header_len: usize) -> Option<usize> {
    SEGMENT_BUDGET
        .checked_sub(header_len + FragmentHeader::LEN + 1)
        .filter(|capacity| *capacity > 0)
}

/// Largest payload that fits in one segment number.
pub fn max_payload(header_len: usize) -> Option<usize> {
    fragment_capacity(header_len).map(|capacity| capacity * MAX_FRAGMENTS)
}

/// Splits `data` into length-prefixed fragments framed with `identifier`.
///
/// With `multi_fragment` every fragment also carries a (total, index)
/// header and is tagged with its index.
pub fn split_payload(
    identifier: &IdentifierHeader,
    data: &[u8],
    multi_fragment: bool,
) -> Result<Vec<Fragment>> {
    let capacity = fragment_capacity(identifier.len()).ok_or_else(|| {
        SqueezeError::InvalidIdentifier(
            identifier.name().to_string(),
            "too long to fit in a segment".to_string(),
        )
    })?;

    let max = capacity * MAX_FRAGMENTS;
    if data.len() > max {
        return Err(SqueezeError::PayloadTooLarge {
            size: data.len(),
            max,
        });
    }

    // 256 fragments wraps to 0 in the one-byte total
    let total = data.len().div_ceil(capacity) as u8;

    let fragments = data
        .chunks(capacity)
        .enumerate()
        .map(|(i, slice)| {
            let index = i as u8;
            let mut inner =
                Vec::with_capacity(identifier.len() + FragmentHeader::LEN + slice.len());
            inner.extend_from_slice(identifier.as_bytes());
            if multi_fragment {
                inner.extend_from_slice(&FragmentHeader { total, index }.to_bytes());
            }
            inner.extend_from_slice(slice);

            let length = (inner.len() + LENGTH_FIELD_LEN) as u16;
            let mut raw = Vec::with_capacity(LENGTH_FIELD_LEN + inner.len());
            raw.extend_from_slice(&length.to_be_bytes());
            raw.extend_from_slice(&inner);

            Fragment::new(multi_fragment.then_some(index), raw)
        })
        .collect();

    Ok(fragments)
}

/// Splices APPn segments into the buffer they were scanned from.
pub struct JpegWriter<'a> {
    source: &'a [u8],
    region: Range<usize>,
}

impl<'a> JpegWriter<'a> {
    /// Creates a writer replacing `region` of `source`.
    pub fn new(source: &'a [u8], region: Range<usize>) -> Self {
        Self { source, region }
    }

    /// Serializes every segment in ascending segment number.
    ///
    /// Within a segment, fragments are ordered by index with untagged
    /// fragments first, keeping their stored order.
    pub fn encode_segments(segments: &BTreeMap<u8, Vec<Fragment>>) -> Vec<u8> {
        let size: usize = segments
            .values()
            .flatten()
            .map(|fragment| fragment.raw.len() + 2)
            .sum();
        let mut output = Vec::with_capacity(size);

        for (&number, fragments) in segments {
            let mut ordered: Vec<&Fragment> = fragments.iter().collect();
            ordered.sort_by_key(|fragment| fragment.index);

            for fragment in ordered {
                output.push(MARKER_PREFIX);
                output.push(app_marker(number));
                output.extend_from_slice(&fragment.raw);
            }
        }

        output
    }

    /// Writes the full file: bytes before the region, the segments, then
    /// bytes after the region.
    pub fn write(&self, segments: &BTreeMap<u8, Vec<Fragment>>) -> Vec<u8> {
        let encoded = Self::encode_segments(segments);
        let head = &self.source[..self.region.start];
        let tail = &self.source[self.region.end..];

        let mut output = Vec::with_capacity(head.len() + encoded.len() + tail.len());
        output.extend_from_slice(head);
        output.extend_from_slice(&encoded);
        output.extend_from_slice(tail);
        output
    }
}
