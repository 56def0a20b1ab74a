//! JPEG APPn segment scanner.
//!
//! Locates APPn markers in a JPEG buffer and slices out the bytes each one
//! carries, recording the byte range later replaced on save.

use crate::error::{Result, SqueezeError};
use crate::types::ScanMode;
use std::collections::BTreeMap;
use std::ops::Range;

/// First byte of every JPEG marker, also the resync sentinel.
pub const MARKER_PREFIX: u8 = 0xFF;

/// Marker byte of APP0. APPn is `APP0 + n`.
pub const APP0: u8 = 0xE0;

/// Number of APPn segment numbers (APP0 to APP15).
pub const APP_SEGMENT_COUNT: u8 = 16;

/// Size of the length field that follows every APPn marker.
pub const LENGTH_FIELD_LEN: usize = 2;

/// Returns the segment number `n` if `byte` is the APPn marker byte.
pub fn app_segment_number(byte: u8) -> Option<u8> {
    byte.checked_sub(APP0).filter(|n| *n < APP_SEGMENT_COUNT)
}

/// Returns the marker byte for segment number `n`.
pub fn app_marker(segment: u8) -> u8 {
    APP0 + segment
}

/// One APPn occurrence: the bytes between its marker and the next resync
/// point, starting with the 2-byte length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position within a split payload, `None` when written unsplit or
    /// when scanned from a file
    pub index: Option<u8>,
    /// Length field plus segment body
    pub raw: Vec<u8>,
}

impl Fragment {
    /// Creates a new fragment.
    pub fn new(index: Option<u8>, raw: Vec<u8>) -> Self {
        Self { index, raw }
    }

    /// The value of the length field, if the fragment has one.
    pub fn declared_length(&self) -> Option<u16> {
        match self.raw.as_slice() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// Segment body after the length field.
    pub fn body(&self) -> &[u8] {
        self.raw.get(LENGTH_FIELD_LEN..).unwrap_or_default()
    }
}

/// APPn segments found in a JPEG buffer.
#[derive(Debug, Clone)]
pub struct JpegParser {
    segments: BTreeMap<u8, Vec<Fragment>>,
    region: Range<usize>,
}

impl JpegParser {
    /// Scans `data` for APPn markers.
    ///
    /// Each marker's length field gives a tentative end; from there the
    /// scanner walks forward to the next `0xFF` byte (or end of buffer) and
    /// takes that as the true end. The region starts at the lowest marker
    /// offset and ends where the last processed segment ends, processing
    /// segment numbers in the order they were first seen.
    pub fn parse(data: &[u8], mode: ScanMode) -> Result<Self> {
        let mut first_seen: Vec<u8> = Vec::new();
        let mut markers: BTreeMap<u8, Vec<usize>> = BTreeMap::new();

        for pos in (0..data.len().saturating_sub(1)).step_by(mode.stride()) {
            if data[pos] != MARKER_PREFIX {
                continue;
            }
            if let Some(number) = app_segment_number(data[pos + 1]) {
                markers
                    .entry(number)
                    .or_insert_with(|| {
                        first_seen.push(number);
                        Vec::new()
                    })
                    .push(pos);
            }
        }

        let Some(start) = markers.values().flatten().copied().min() else {
            // No APPn at all: new segments go right after SOI
            let at = data.len().min(2);
            log::debug!("no APPn markers found, insertion point {}", at);
            return Ok(Self {
                segments: BTreeMap::new(),
                region: at..at,
            });
        };

        let mut segments: BTreeMap<u8, Vec<Fragment>> = BTreeMap::new();
        let mut cursor = start;

        for number in first_seen {
            for &marker in &markers[&number] {
                let end = segment_end(data, marker)?;
                log::trace!("APP{} at {}..{}", number, marker, end);

                segments
                    .entry(number)
                    .or_default()
                    .push(Fragment::new(None, data[marker + 2..end].to_vec()));
                cursor = end;
            }
        }

        log::debug!(
            "scanned {} APPn segment numbers, region {}..{}",
            segments.len(),
            start,
            cursor
        );

        Ok(Self {
            segments,
            region: start..cursor,
        })
    }

    /// Segments keyed by segment number.
    pub fn segments(&self) -> &BTreeMap<u8, Vec<Fragment>> {
        &self.segments
    }

    /// Byte range replaced on save.
    pub fn region(&self) -> Range<usize> {
        self.region.clone()
    }

    /// Splits the parser into its segment table and region.
    pub fn into_parts(self) -> (BTreeMap<u8, Vec<Fragment>>, Range<usize>) {
        (self.segments, self.region)
    }
}

/// Finds where the segment whose marker sits at `marker` ends.
fn segment_end(data: &[u8], marker: usize) -> Result<usize> {
    let length = data
        .get(marker + 2..marker + 4)
        .ok_or(SqueezeError::Truncated {
            what: "APPn length field",
            offset: marker,
        })?;
    let length = u16::from_be_bytes([length[0], length[1]]) as usize;
    let declared_end = marker + 2 + length;

    let end = data
        .get(declared_end..)
        .and_then(|rest| rest.iter().position(|&b| b == MARKER_PREFIX))
        .map_or(data.len(), |skip| declared_end + skip);

    if end != declared_end {
        log::warn!(
            "APPn at {} declares end {}, resynced to {}",
            marker,
            declared_end,
            end
        );
    }

    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_segment_number() {
        assert_eq!(app_segment_number(0xE0), Some(0));
        assert_eq!(app_segment_number(0xEF), Some(15));
        assert_eq!(app_segment_number(0xD8), None);
        assert_eq!(app_segment_number(0xF0), None);
        assert_eq!(app_marker(4), 0xE4);
    }

    #[test]
    fn test_minimal_app4() {
        // SOI, APP4 (length 6, 4 data bytes), EOI
        let data = vec![
            0xFF, 0xD8, 0xFF, 0xE4, 0x00, 0x06, 0x01, 0x02, 0x03, 0x04, 0xFF, 0xD9,
        ];
        let parser = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert_eq!(parser.region(), 2..10);

        let fragments = &parser.segments()[&4];
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].index, None);
        assert_eq!(fragments[0].raw, vec![0x00, 0x06, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(fragments[0].declared_length(), Some(6));
        assert_eq!(fragments[0].body(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_no_app_markers() {
        let data = vec![0xFF, 0xD8, 0xFF, 0xD9];
        let parser = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert!(parser.segments().is_empty());
        assert_eq!(parser.region(), 2..2);
    }

    #[test]
    fn test_resync_past_short_length() {
        // Length says 4 but the body runs two bytes longer
        let data = vec![
            0xFF, 0xD8, 0xFF, 0xE5, 0x00, 0x04, 0x0A, 0x0B, 0x0C, 0x0D, 0xFF, 0xD9,
        ];
        let parser = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert_eq!(parser.region(), 2..10);
        assert_eq!(parser.segments()[&5][0].body(), &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn test_resync_to_end_of_buffer() {
        let data = vec![0xFF, 0xD8, 0xFF, 0xE6, 0x00, 0x10, 0x01, 0x02];
        let parser = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert_eq!(parser.region(), 2..8);
        assert_eq!(parser.segments()[&6][0].body(), &[1, 2]);
    }

    #[test]
    fn test_truncated_length_field() {
        let data = vec![0xFF, 0xD8, 0xFF, 0xE4, 0x00];
        let err = JpegParser::parse(&data, ScanMode::Strided).unwrap_err();
        assert!(matches!(err, SqueezeError::Truncated { offset: 2, .. }));
    }

    #[test]
    fn test_odd_offset_marker_needs_exhaustive_scan() {
        // APP4 body has odd length, so APP5 lands at offset 7
        let data = vec![
            0xFF, 0xD8, 0xFF, 0xE4, 0x00, 0x03, 0x01, 0xFF, 0xE5, 0x00, 0x03, 0x02, 0xFF, 0xD9,
        ];

        let strided = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert!(strided.segments().contains_key(&4));
        assert!(!strided.segments().contains_key(&5));
        assert_eq!(strided.region(), 2..7);

        let exhaustive = JpegParser::parse(&data, ScanMode::Exhaustive).unwrap();
        assert_eq!(exhaustive.segments()[&5][0].body(), &[0x02]);
        assert_eq!(exhaustive.region(), 2..12);
    }

    #[test]
    fn test_region_follows_first_seen_order() {
        // APP0 is seen first, so both APP0 occurrences are processed before
        // APP1 and the region ends where APP1 ends
        let data = vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x06, 0x01, 0x01, 0x01, 0x01, // APP0
            0xFF, 0xE1, 0x00, 0x04, 0x02, 0x02, // APP1
            0xFF, 0xE0, 0x00, 0x04, 0x03, 0x03, // APP0 again
            0xFF, 0xD9,
        ];
        let parser = JpegParser::parse(&data, ScanMode::Strided).unwrap();
        assert_eq!(parser.region(), 2..16);
        assert_eq!(parser.segments()[&0].len(), 2);
        assert_eq!(parser.segments()[&0][1].body(), &[3, 3]);
        assert_eq!(parser.segments()[&1].len(), 1);
    }
}
