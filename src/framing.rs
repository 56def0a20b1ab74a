//! Payload framing shared by both codecs.
//!
//! Every stored unit starts with the identifier bytes and a NUL terminator.
//! JPEG units may follow that with a two byte fragment header
//! (total fragments, fragment index) when a payload is split across
//! several segments.

use crate::error::{Result, SqueezeError};

/// Terminator after the identifier bytes.
pub const NUL: u8 = 0x00;

/// Identifier bytes plus NUL terminator, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierHeader {
    name: String,
    bytes: Vec<u8>,
}

impl IdentifierHeader {
    /// Builds the header for `identifier`.
    ///
    /// Identifiers containing a NUL byte cannot be told apart from their
    /// terminator and are rejected.
    pub fn new(identifier: &str) -> Result<Self> {
        if identifier.as_bytes().contains(&NUL) {
            return Err(SqueezeError::InvalidIdentifier(
                identifier.to_string(),
                "contains a NUL byte".to_string(),
            ));
        }

        let mut bytes = Vec::with_capacity(identifier.len() + 1);
        bytes.extend_from_slice(identifier.as_bytes());
        bytes.push(NUL);

        Ok(Self {
            name: identifier.to_string(),
            bytes,
        })
    }

    /// Builds the header used to look a stored unit up. An identifier that
    /// cannot be framed matches nothing, so it is reported as a mismatch.
    pub fn for_lookup(identifier: &str) -> Result<Self> {
        Self::new(identifier).map_err(|_| SqueezeError::IdentifierMismatch(identifier.to_string()))
    }

    /// The identifier without terminator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header bytes including the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Header length including the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the identifier itself is empty (header is a bare NUL).
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Returns the bytes following the header in `data`.
    pub fn strip<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.strip_prefix(self.bytes.as_slice())
            .ok_or_else(|| SqueezeError::IdentifierMismatch(self.name.clone()))
    }

    /// Concatenates header and payload.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut framed = Vec::with_capacity(self.bytes.len() + payload.len());
        framed.extend_from_slice(&self.bytes);
        framed.extend_from_slice(payload);
        framed
    }
}

/// Position of a fragment within a split payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Number of fragments the payload was split into, modulo 256
    pub total: u8,
    /// Zero-based index of this fragment
    pub index: u8,
}

impl FragmentHeader {
    /// Encoded size in bytes.
    pub const LEN: usize = 2;

    /// Splits a fragment header off the front of `data`.
    pub fn split(data: &[u8]) -> Option<(Self, &[u8])> {
        match data {
            [total, index, rest @ ..] => Some((
                Self {
                    total: *total,
                    index: *index,
                },
                rest,
            )),
            _ => None,
        }
    }

    /// Encodes the header.
    pub fn to_bytes(self) -> [u8; 2] {
        [self.total, self.index]
    }

    /// Declared fragment count. A stored total of 0 stands for 256, the
    /// only count that does not fit in one byte.
    pub fn declared_total(self) -> usize {
        if self.total == 0 {
            256
        } else {
            self.total as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_header_bytes() {
        let header = IdentifierHeader::new("tag").unwrap();
        assert_eq!(header.as_bytes(), b"tag\0");
        assert_eq!(header.len(), 4);
        assert!(!header.is_empty());
    }

    #[test]
    fn test_identifier_with_nul_rejected() {
        let err = IdentifierHeader::new("ta\0g").unwrap_err();
        assert!(matches!(err, SqueezeError::InvalidIdentifier(..)));
    }

    #[test]
    fn test_lookup_with_nul_is_mismatch() {
        assert!(matches!(
            IdentifierHeader::for_lookup("ta\0g"),
            Err(SqueezeError::IdentifierMismatch(ref id)) if id == "ta\0g"
        ));
        assert_eq!(IdentifierHeader::for_lookup("tag").unwrap().as_bytes(), b"tag\0");
    }

    #[test]
    fn test_strip() {
        let header = IdentifierHeader::new("tag").unwrap();
        assert_eq!(header.strip(b"tag\0payload").unwrap(), b"payload");
        assert!(matches!(
            header.strip(b"tags\0payload"),
            Err(SqueezeError::IdentifierMismatch(_))
        ));
        assert!(header.strip(b"ta").is_err());
    }

    #[test]
    fn test_frame() {
        let header = IdentifierHeader::new("id").unwrap();
        assert_eq!(header.frame(b"xy"), b"id\0xy");
    }

    #[test]
    fn test_fragment_header_split() {
        let (header, rest) = FragmentHeader::split(&[3, 1, 9, 9]).unwrap();
        assert_eq!(header, FragmentHeader { total: 3, index: 1 });
        assert_eq!(rest, &[9, 9]);
        assert_eq!(header.to_bytes(), [3, 1]);
        assert!(FragmentHeader::split(&[3]).is_none());
    }

    #[test]
    fn test_declared_total_wraps() {
        assert_eq!(FragmentHeader { total: 0, index: 255 }.declared_total(), 256);
        assert_eq!(FragmentHeader { total: 7, index: 0 }.declared_total(), 7);
    }
}
