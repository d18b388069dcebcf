//! Fixed-layout binary framing for the Flamingo NUC protocol.
//!
//! Two wire formats live here:
//! - Command frames: exactly 128 bytes, bracketed by the start marker
//!   `0xF321E654` and the end marker `0xFEDC4321`, optionally followed by
//!   `additional_data_bytes` raw bytes (a workflow file, a response body).
//! - Live images: a 40-byte header of ten `u32` words followed by
//!   `payload_size` bytes of little-endian `u16` pixels.
//!
//! Readers loop over short reads; callers always get whole frames or an error.

pub mod catalog;
#[cfg(feature = "async")]
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod image;
mod io;
pub mod reader;
pub mod writer;

pub use catalog::{CatalogError, CommandCatalog};
#[cfg(feature = "async")]
pub use codec::{CommandCodec, ImageCodec};
pub use command::{
    CommandFrame, Response, COMMAND_FRAME_SIZE, END_MARKER, RESERVED_SIZE, START_MARKER,
};
pub use config::{FrameConfig, DEFAULT_MAX_IMAGE_SIZE, DEFAULT_MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use image::{ImageFrame, ImageHeader, BYTES_PER_PIXEL, IMAGE_HEADER_SIZE};
pub use reader::{CommandReader, ImageReader};
pub use writer::{CommandWriter, ImageWriter};
