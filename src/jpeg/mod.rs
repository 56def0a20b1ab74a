//! JPEG APPn segment handling.
//!
//! This module scans, rewrites and splices APPn (0xFFE0-0xFFEF) segments:
//! - Scanning the APPn segment table and the region it occupies
//! - Splitting payloads into length-limited fragments
//! - Re-emitting the table in place of the original region

pub mod codec;
pub mod parser;
pub mod writer;

pub use codec::{JpegCodec, FREE_SEGMENTS};
pub use parser::{Fragment, JpegParser};
pub use writer::JpegWriter;
