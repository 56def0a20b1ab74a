//! Format dispatch over the JPEG and PNG codecs.

use crate::error::{Result, SqueezeError};
use crate::jpeg::JpegCodec;
use crate::png::PngCodec;
use crate::types::{CodecOptions, ImageFormat};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Operations every container codec provides.
///
/// A codec scans a whole file into a table of payload units, reads and
/// replaces units by slot, and splices the table back on save. Bytes that
/// are not payload units are reproduced unchanged.
pub trait MetadataContainer: Sized {
    /// What addresses a payload unit: a segment number or a chunk type.
    type Slot: ?Sized;

    /// Format this codec handles.
    const FORMAT: ImageFormat;

    /// Scans `source` into a unit table.
    fn scan(source: Vec<u8>, options: CodecOptions) -> Result<Self>;

    /// Reads the payload under `slot`. `Ok(None)` means the slot is empty
    /// and the format treats that as a normal outcome.
    fn read(&self, slot: &Self::Slot, identifier: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces the payload under `slot`.
    fn write(&mut self, slot: &Self::Slot, identifier: &str, data: &[u8]) -> Result<()>;

    /// Serializes the file.
    fn save(self) -> Vec<u8>;
}

impl MetadataContainer for JpegCodec {
    type Slot = u8;
    const FORMAT: ImageFormat = ImageFormat::Jpeg;

    fn scan(source: Vec<u8>, options: CodecOptions) -> Result<Self> {
        JpegCodec::with_options(source, options)
    }

    fn read(&self, slot: &u8, identifier: &str) -> Result<Option<Vec<u8>>> {
        JpegCodec::read(self, *slot, identifier)
    }

    fn write(&mut self, slot: &u8, identifier: &str, data: &[u8]) -> Result<()> {
        JpegCodec::write(self, *slot, identifier, data)
    }

    fn save(self) -> Vec<u8> {
        JpegCodec::save(self)
    }
}

impl MetadataContainer for PngCodec {
    type Slot = str;
    const FORMAT: ImageFormat = ImageFormat::Png;

    fn scan(source: Vec<u8>, options: CodecOptions) -> Result<Self> {
        PngCodec::with_options(source, options)
    }

    fn read(&self, slot: &str, identifier: &str) -> Result<Option<Vec<u8>>> {
        PngCodec::read(self, slot, identifier).map(Some)
    }

    fn write(&mut self, slot: &str, identifier: &str, data: &[u8]) -> Result<()> {
        PngCodec::write(self, slot, identifier, data)
    }

    fn save(self) -> Vec<u8> {
        PngCodec::save(self)
    }
}

/// Format-independent address of a payload unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// JPEG APPn segment number
    Segment(u8),
    /// PNG chunk type
    Chunk(String),
}

impl Slot {
    /// Interprets a textual selector for `format`: a decimal segment number
    /// for JPEG, a chunk type for PNG.
    pub fn parse(format: ImageFormat, selector: &str) -> Result<Self> {
        match format {
            ImageFormat::Jpeg => selector
                .trim()
                .parse::<u8>()
                .map(Slot::Segment)
                .map_err(|_| SqueezeError::SlotMismatch {
                    slot: selector.to_string(),
                    format: format.to_string(),
                }),
            ImageFormat::Png => Ok(Slot::Chunk(selector.to_string())),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Segment(n) => write!(f, "APP{}", n),
            Slot::Chunk(t) => f.write_str(t),
        }
    }
}

/// An image opened with the codec matching its signature.
#[derive(Debug, Clone)]
pub enum Image {
    Jpeg(JpegCodec),
    Png(PngCodec),
}

impl Image {
    /// Opens an in-memory file with default options.
    pub fn from_bytes(source: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(source, CodecOptions::default())
    }

    /// Opens an in-memory file, picking the codec by signature.
    pub fn from_bytes_with_options(source: Vec<u8>, options: CodecOptions) -> Result<Self> {
        let format = ImageFormat::detect(&source).ok_or(SqueezeError::FormatNotRecognized)?;
        log::debug!("detected {} ({} bytes)", format, source.len());

        match format {
            ImageFormat::Jpeg => Ok(Image::Jpeg(JpegCodec::scan(source, options)?)),
            ImageFormat::Png => Ok(Image::Png(PngCodec::scan(source, options)?)),
        }
    }

    /// Reads `reader` to the end and opens the result.
    pub fn from_reader<R: Read>(mut reader: R, options: CodecOptions) -> Result<Self> {
        let mut source = Vec::new();
        reader.read_to_end(&mut source)?;
        Self::from_bytes_with_options(source, options)
    }

    /// Opens the file at `path`, which must exist.
    pub fn open<P: AsRef<Path>>(path: P, options: CodecOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SqueezeError::InvalidSource(format!(
                "{} is not an existing file",
                path.display()
            )));
        }
        Self::from_bytes_with_options(std::fs::read(path)?, options)
    }

    /// Detected format.
    pub fn format(&self) -> ImageFormat {
        match self {
            Image::Jpeg(_) => JpegCodec::FORMAT,
            Image::Png(_) => PngCodec::FORMAT,
        }
    }

    /// Reads the payload under `slot`.
    pub fn read(&self, slot: &Slot, identifier: &str) -> Result<Option<Vec<u8>>> {
        match (self, slot) {
            (Image::Jpeg(codec), Slot::Segment(n)) => MetadataContainer::read(codec, n, identifier),
            (Image::Png(codec), Slot::Chunk(t)) => MetadataContainer::read(codec, t.as_str(), identifier),
            (image, _) => Err(image.mismatch(slot)),
        }
    }

    /// Replaces the payload under `slot`.
    pub fn write(&mut self, slot: &Slot, identifier: &str, data: &[u8]) -> Result<()> {
        match (self, slot) {
            (Image::Jpeg(codec), Slot::Segment(n)) => {
                MetadataContainer::write(codec, n, identifier, data)
            }
            (Image::Png(codec), Slot::Chunk(t)) => {
                MetadataContainer::write(codec, t.as_str(), identifier, data)
            }
            (image, _) => Err(image.mismatch(slot)),
        }
    }

    /// Serializes the file.
    pub fn save(self) -> Vec<u8> {
        match self {
            Image::Jpeg(codec) => MetadataContainer::save(codec),
            Image::Png(codec) => MetadataContainer::save(codec),
        }
    }

    /// Serializes into `sink`.
    pub fn save_to<W: Write>(self, sink: &mut W) -> Result<()> {
        sink.write_all(&self.save())?;
        Ok(())
    }

    fn mismatch(&self, slot: &Slot) -> SqueezeError {
        SqueezeError::SlotMismatch {
            slot: slot.to_string(),
            format: self.format().to_string(),
        }
    }
}

/// Opens `buffer`, stores `data` under `selector` and returns the new file.
pub fn embed(
    buffer: &[u8],
    selector: &str,
    identifier: &str,
    data: &[u8],
    options: &CodecOptions,
) -> Result<Vec<u8>> {
    let mut image = Image::from_bytes_with_options(buffer.to_vec(), options.clone())?;
    let slot = Slot::parse(image.format(), selector)?;
    image.write(&slot, identifier, data)?;
    Ok(image.save())
}

/// Opens `buffer` and reads the payload under `selector`.
pub fn extract(
    buffer: &[u8],
    selector: &str,
    identifier: &str,
    options: &CodecOptions,
) -> Result<Option<Vec<u8>>> {
    let image = Image::from_bytes_with_options(buffer.to_vec(), options.clone())?;
    let slot = Slot::parse(image.format(), selector)?;
    image.read(&slot, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::PngChunk;
    use crate::types::PNG_SIGNATURE;
    use std::io::Cursor;

    fn minimal_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE4, 0x00, 0x06, 0x01, 0x02, 0x03, 0x04, 0xFF, 0xD9]
    }

    fn minimal_png() -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        PngChunk::new(*b"IHDR", vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]).encode_into(&mut data);
        PngChunk::new(*b"IEND", Vec::new()).encode_into(&mut data);
        data
    }

    fn round_trip<C: MetadataContainer>(source: Vec<u8>, slot: &C::Slot) -> Option<Vec<u8>> {
        let mut codec = C::scan(source, CodecOptions::default()).unwrap();
        codec.write(slot, "generic", b"payload").unwrap();
        C::scan(codec.save(), CodecOptions::default())
            .unwrap()
            .read(slot, "generic")
            .unwrap()
    }

    #[test]
    fn test_trait_round_trip() {
        assert_eq!(round_trip::<JpegCodec>(minimal_jpeg(), &5), Some(b"payload".to_vec()));
        assert_eq!(round_trip::<PngCodec>(minimal_png(), "ruSt"), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_dispatch_by_signature() {
        assert_eq!(Image::from_bytes(minimal_jpeg()).unwrap().format(), ImageFormat::Jpeg);
        assert_eq!(Image::from_bytes(minimal_png()).unwrap().format(), ImageFormat::Png);
        assert!(matches!(
            Image::from_bytes(b"GIF89a".to_vec()),
            Err(SqueezeError::FormatNotRecognized)
        ));
        assert!(matches!(
            Image::from_bytes(Vec::new()),
            Err(SqueezeError::FormatNotRecognized)
        ));
    }

    #[test]
    fn test_slot_parse() {
        assert_eq!(Slot::parse(ImageFormat::Jpeg, "11").unwrap(), Slot::Segment(11));
        assert_eq!(
            Slot::parse(ImageFormat::Png, "stEg").unwrap(),
            Slot::Chunk("stEg".to_string())
        );
        assert!(matches!(
            Slot::parse(ImageFormat::Jpeg, "stEg"),
            Err(SqueezeError::SlotMismatch { .. })
        ));
        assert_eq!(Slot::Segment(4).to_string(), "APP4");
    }

    #[test]
    fn test_slot_kind_must_match_format() {
        let mut image = Image::from_bytes(minimal_png()).unwrap();
        assert!(matches!(
            image.write(&Slot::Segment(4), "tag", b"x"),
            Err(SqueezeError::SlotMismatch { ref format, .. }) if format == "png"
        ));
        assert!(matches!(
            image.read(&Slot::Segment(4), "tag"),
            Err(SqueezeError::SlotMismatch { .. })
        ));
    }

    #[test]
    fn test_from_reader() {
        let mut image = Image::from_reader(Cursor::new(minimal_jpeg()), CodecOptions::default()).unwrap();
        image.write(&Slot::Segment(4), "tag", b"hi").unwrap();

        let mut out = Vec::new();
        image.save_to(&mut out).unwrap();
        let reopened = Image::from_bytes(out).unwrap();
        assert_eq!(reopened.read(&Slot::Segment(4), "tag").unwrap(), Some(b"hi".to_vec()));
    }

    #[test]
    fn test_open_missing_path() {
        let path = std::env::temp_dir().join("pigsqueeze-does-not-exist.jpg");
        assert!(matches!(
            Image::open(&path, CodecOptions::default()),
            Err(SqueezeError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_open_existing_file() {
        let path = std::env::temp_dir().join(format!("pigsqueeze-open-{}.png", std::process::id()));
        std::fs::write(&path, minimal_png()).unwrap();
        let image = Image::open(&path, CodecOptions::default());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(image.unwrap().format(), ImageFormat::Png);
    }

    #[test]
    fn test_embed_and_extract() {
        let options = CodecOptions::default();

        let jpeg = embed(&minimal_jpeg(), "4", "tag", b"hi", &options).unwrap();
        assert_eq!(extract(&jpeg, "4", "tag", &options).unwrap(), Some(b"hi".to_vec()));
        assert_eq!(extract(&jpeg, "5", "tag", &options).unwrap(), None);

        let png = embed(&minimal_png(), "stEg", "tag", b"hi", &options).unwrap();
        assert_eq!(extract(&png, "stEg", "tag", &options).unwrap(), Some(b"hi".to_vec()));
        assert!(matches!(
            extract(&png, "moRe", "tag", &options),
            Err(SqueezeError::NotFound(_))
        ));
    }
}
