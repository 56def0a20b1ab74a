//! PNG chunk writer.

use super::chunk::PngChunk;
use crate::types::PNG_SIGNATURE;
use std::collections::BTreeMap;

/// Serializes a chunk table back into a PNG file.
///
/// Custom chunks go right after the first standard chunk (IHDR in any
/// well-formed file), in ascending type order. The remaining standard
/// chunks follow in their original order.
pub struct PngWriter<'a> {
    standard: &'a [PngChunk],
    custom: &'a BTreeMap<[u8; 4], PngChunk>,
}

impl<'a> PngWriter<'a> {
    /// Creates a writer over the given chunk tables.
    pub fn new(standard: &'a [PngChunk], custom: &'a BTreeMap<[u8; 4], PngChunk>) -> Self {
        Self { standard, custom }
    }

    /// Writes the PNG to a byte vector.
    pub fn write(&self) -> Vec<u8> {
        let (leading, rest) = self.standard.split_at(self.standard.len().min(1));

        let size = PNG_SIGNATURE.len()
            + self
                .standard
                .iter()
                .chain(self.custom.values())
                .map(PngChunk::encoded_len)
                .sum::<usize>();
        let mut output = Vec::with_capacity(size);
        output.extend_from_slice(PNG_SIGNATURE);

        for chunk in leading.iter().chain(self.custom.values()).chain(rest) {
            chunk.encode_into(&mut output);
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_types(png: &[u8]) -> Vec<String> {
        let mut types = Vec::new();
        let mut pos = PNG_SIGNATURE.len();
        while pos < png.len() {
            let length = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
            types.push(String::from_utf8_lossy(&png[pos + 4..pos + 8]).into_owned());
            pos += 12 + length;
        }
        types
    }

    #[test]
    fn test_custom_chunks_after_first_standard() {
        let standard = vec![
            PngChunk::new(*b"IHDR", vec![0; 13]),
            PngChunk::new(*b"IDAT", vec![1, 2]),
            PngChunk::new(*b"IEND", Vec::new()),
        ];
        let mut custom = BTreeMap::new();
        custom.insert(*b"zzZz", PngChunk::new(*b"zzZz", vec![9]));
        custom.insert(*b"abCd", PngChunk::new(*b"abCd", vec![8]));

        let png = PngWriter::new(&standard, &custom).write();
        assert!(png.starts_with(PNG_SIGNATURE));
        assert_eq!(chunk_types(&png), vec!["IHDR", "abCd", "zzZz", "IDAT", "IEND"]);
    }

    #[test]
    fn test_no_standard_chunks() {
        let mut custom = BTreeMap::new();
        custom.insert(*b"stEg", PngChunk::new(*b"stEg", vec![1]));

        let png = PngWriter::new(&[], &custom).write();
        assert_eq!(chunk_types(&png), vec!["stEg"]);
    }

    #[test]
    fn test_empty_table() {
        let custom = BTreeMap::new();
        assert_eq!(PngWriter::new(&[], &custom).write(), PNG_SIGNATURE.to_vec());
    }
}
