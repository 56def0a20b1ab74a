//! Shared types for container operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use wasm_bindgen::prelude::*;

use crate::error::Result;

/// JPEG Start of Image marker.
pub const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8];

/// PNG file signature.
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Container formats the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[wasm_bindgen]
pub enum ImageFormat {
    /// JPEG/JFIF, payloads live in APPn segments
    Jpeg = 0,
    /// PNG, payloads live in private ancillary chunks
    Png = 1,
}

impl ImageFormat {
    /// Formats in probe order.
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

    /// Fixed header every file of this format starts with.
    pub fn signature(self) -> &'static [u8] {
        match self {
            ImageFormat::Jpeg => JPEG_SIGNATURE,
            ImageFormat::Png => PNG_SIGNATURE,
        }
    }

    /// Lowercase format name.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    /// Returns the first format whose signature prefixes `header`.
    pub fn detect(header: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| header.starts_with(format.signature()))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the JPEG scanner looks for APPn markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[wasm_bindgen]
pub enum ScanMode {
    /// Only even byte offsets are probed. Markers at odd offsets are missed,
    /// which keeps byte-level compatibility with files written by earlier
    /// releases.
    Strided = 0,
    /// Every byte offset is probed.
    Exhaustive = 1,
}

impl Default for ScanMode {
    fn default() -> Self {
        ScanMode::Strided
    }
}

impl ScanMode {
    /// Distance between two probed offsets.
    pub fn stride(self) -> usize {
        match self {
            ScanMode::Strided => 2,
            ScanMode::Exhaustive => 1,
        }
    }
}

/// Options shared by both codecs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[wasm_bindgen]
pub struct CodecOptions {
    /// Frame JPEG payloads with a (total, index) fragment header
    #[wasm_bindgen(js_name = multiFragment)]
    pub multi_fragment: bool,

    /// JPEG marker scan strategy
    #[wasm_bindgen(js_name = scanMode)]
    pub scan_mode: ScanMode,

    /// Reject multi-fragment reads whose fragments do not cover 0..total
    #[wasm_bindgen(js_name = strictFragments)]
    pub strict_fragments: bool,

    /// Check every PNG chunk CRC while scanning
    #[wasm_bindgen(js_name = verifyCrc)]
    pub verify_crc: bool,
}

#[wasm_bindgen]
impl CodecOptions {
    /// Creates options with default values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that reject incomplete or corrupted units.
    pub fn strict() -> Self {
        Self {
            strict_fragments: true,
            verify_crc: true,
            ..Self::default()
        }
    }
}

impl CodecOptions {
    /// Parses options from JSON. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            multi_fragment: true,
            scan_mode: ScanMode::Strided,
            strict_fragments: false,
            verify_crc: false,
        }
    }
}
