//! pigsqueeze
//!
//! Hides identifier-tagged payloads inside image container metadata,
//! compiled to WebAssembly for client-side use and shipped with a small CLI.
//!
//! # Features
//!
//! - **JPEG**: Payloads in APPn segments, split across up to 256 fragments
//! - **PNG**: Payloads in private ancillary chunks placed after IHDR
//! - **Non-destructive**: Everything outside the rewritten units is kept
//!   byte for byte
//! - **Detection**: Format dispatch by file signature
//!
//! # License
//!
//! GPL-2.0-or-later

#![allow(clippy::unused_unit)]

use wasm_bindgen::prelude::*;

pub mod container;
pub mod error;
pub mod framing;
pub mod jpeg;
pub mod png;
pub mod types;

pub use container::{Image, MetadataContainer, Slot};
pub use error::{Result, SqueezeError};
pub use jpeg::JpegCodec;
pub use png::PngCodec;

/// Detects the container format of a buffer from its signature.
///
/// # Arguments
/// * `buffer` - File contents, or at least its first 8 bytes
///
/// # Returns
/// The detected format, or `undefined` if no signature matches.
#[wasm_bindgen(js_name = detectFormat)]
pub fn detect_format(buffer: &[u8]) -> Option<ImageFormat> {
    ImageFormat::detect(buffer)
}

/// Embeds a payload and returns the rewritten file.
///
/// # Arguments
/// * `buffer` - JPEG or PNG file contents
/// * `selector` - APPn segment number for JPEG (`"4"`), chunk type for PNG (`"stEg"`)
/// * `identifier` - Tag stored in front of the payload
/// * `data` - Payload bytes
/// * `options` - Codec options
///
/// # Errors
/// Returns an error if the format is not recognized, the selector does not
/// address a writable slot, or the payload does not fit.
///
/// # Example (JavaScript)
/// ```js
/// const options = createDefaultOptions();
/// const image = new Uint8Array(await file.arrayBuffer());
/// const tagged = embedPayload(image, "4", "notes", new TextEncoder().encode("hi"), options);
/// ```
#[wasm_bindgen(js_name = embedPayload)]
pub fn embed_payload(
    buffer: &[u8],
    selector: &str,
    identifier: &str,
    data: &[u8],
    options: &CodecOptions,
) -> std::result::Result<Vec<u8>, JsValue> {
    container::embed(buffer, selector, identifier, data, options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extracts a payload.
///
/// # Arguments
/// * `buffer` - JPEG or PNG file contents
/// * `selector` - APPn segment number for JPEG, chunk type for PNG
/// * `identifier` - Tag the payload was stored with
/// * `options` - Codec options
///
/// # Returns
/// The payload, or `undefined` if the JPEG segment is absent.
///
/// # Errors
/// Returns an error if the identifier does not match, the PNG chunk is
/// absent, or the file is malformed.
#[wasm_bindgen(js_name = extractPayload)]
pub fn extract_payload(
    buffer: &[u8],
    selector: &str,
    identifier: &str,
    options: &CodecOptions,
) -> std::result::Result<Option<Vec<u8>>, JsValue> {
    container::extract(buffer, selector, identifier, options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Creates default codec options.
///
/// # Returns
/// `CodecOptions` with:
/// - multiFragment: true
/// - scanMode: Strided
/// - strictFragments: false
/// - verifyCrc: false
#[wasm_bindgen(js_name = createDefaultOptions)]
pub fn create_default_options() -> CodecOptions {
    CodecOptions::default()
}

/// Creates options that reject incomplete fragment sets and bad CRCs.
#[wasm_bindgen(js_name = createStrictOptions)]
pub fn create_strict_options() -> CodecOptions {
    CodecOptions::strict()
}

// Re-export types for use in WASM
pub use types::{CodecOptions, ImageFormat, ScanMode};
