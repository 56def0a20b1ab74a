//! PNG ancillary chunk handling.
//!
//! Payloads are stored in private ancillary chunks, one payload per chunk
//! type. Custom chunks are re-emitted right after IHDR on save.

pub mod chunk;
pub mod codec;
pub mod parser;
pub mod writer;

pub use chunk::{ChunkType, PngChunk};
pub use codec::PngCodec;
pub use parser::PngParser;
pub use writer::PngWriter;
