use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Live image header: ten little-endian `u32` words.
pub const IMAGE_HEADER_SIZE: usize = 40;

/// Pixels are 16-bit unsigned samples.
pub const BYTES_PER_PIXEL: usize = 2;

const WORD_COUNT: usize = IMAGE_HEADER_SIZE / 4;
const WORD_PAYLOAD_SIZE: usize = 3;
const WORD_WIDTH: usize = 4;
const WORD_HEIGHT: usize = 5;
const WORD_START_INDEX: usize = 8;
const WORD_STOP_INDEX: usize = 9;

/// Header preceding every image on the live channel.
///
/// ```text
/// word meaning
///  0-2 reserved
///    3 payload size in bytes
///    4 width in pixels
///    5 height in pixels
///  6-7 reserved
///    8 start plane index
///    9 stop plane index
/// ```
///
/// Reserved words are kept as received so a header can be re-encoded
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageHeader {
    words: [u32; WORD_COUNT],
}

impl ImageHeader {
    /// Header for a `width` x `height` image with a matching payload size.
    ///
    /// Saturates at `u32::MAX` for dimensions too large to describe.
    pub fn new(width: u32, height: u32) -> Self {
        let payload = u64::from(width) * u64::from(height) * BYTES_PER_PIXEL as u64;
        let mut words = [0u32; WORD_COUNT];
        words[WORD_PAYLOAD_SIZE] = u32::try_from(payload).unwrap_or(u32::MAX);
        words[WORD_WIDTH] = width;
        words[WORD_HEIGHT] = height;
        Self { words }
    }

    /// Set the plane range within a multi-plane acquisition.
    pub fn with_planes(mut self, start: u32, stop: u32) -> Self {
        self.words[WORD_START_INDEX] = start;
        self.words[WORD_STOP_INDEX] = stop;
        self
    }

    /// Override the declared payload size.
    pub fn with_payload_size(mut self, payload_size: u32) -> Self {
        self.words[WORD_PAYLOAD_SIZE] = payload_size;
        self
    }

    pub fn payload_size(&self) -> u32 {
        self.words[WORD_PAYLOAD_SIZE]
    }

    pub fn width(&self) -> u32 {
        self.words[WORD_WIDTH]
    }

    pub fn height(&self) -> u32 {
        self.words[WORD_HEIGHT]
    }

    pub fn start_index(&self) -> u32 {
        self.words[WORD_START_INDEX]
    }

    pub fn stop_index(&self) -> u32 {
        self.words[WORD_STOP_INDEX]
    }

    /// All ten raw header words.
    pub fn words(&self) -> &[u32; WORD_COUNT] {
        &self.words
    }

    /// Number of pixels described by width and height.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Check that the payload fits `max_size` and matches the dimensions.
    pub fn validate(&self, max_size: usize) -> Result<()> {
        let size = self.payload_size() as usize;
        if size > max_size {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: max_size,
            });
        }
        self.check_dimensions()
    }

    pub(crate) fn check_dimensions(&self) -> Result<()> {
        let expected = u64::from(self.width()) * u64::from(self.height()) * BYTES_PER_PIXEL as u64;
        if u64::from(self.payload_size()) != expected {
            return Err(FrameError::ImageSizeMismatch {
                payload_size: self.payload_size(),
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }

    /// Append the 40-byte wire form of this header to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(IMAGE_HEADER_SIZE);
        for word in self.words {
            dst.put_u32_le(word);
        }
    }

    /// Decode a header from exactly 40 bytes.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != IMAGE_HEADER_SIZE {
            return Err(FrameError::InvalidLength {
                expected: IMAGE_HEADER_SIZE,
                actual: src.len(),
            });
        }
        let mut buf = src;
        let mut words = [0u32; WORD_COUNT];
        for word in &mut words {
            *word = buf.get_u32_le();
        }
        Ok(Self { words })
    }
}

/// One image from the live channel.
///
/// Pixels are stored row-major: pixel `(row, col)` lives at
/// `row * width + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub header: ImageHeader,
    pixels: Vec<u16>,
}

impl ImageFrame {
    /// Build an image from pixels, deriving the header from the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u16>) -> Result<Self> {
        let header = ImageHeader::new(width, height);
        if pixels.len() != header.pixel_count() {
            return Err(FrameError::ImageSizeMismatch {
                payload_size: u32::try_from(pixels.len() * BYTES_PER_PIXEL).unwrap_or(u32::MAX),
                width,
                height,
            });
        }
        Ok(Self { header, pixels })
    }

    /// Reinterpret raw little-endian payload bytes under `header`.
    pub fn from_payload(header: ImageHeader, payload: &[u8]) -> Result<Self> {
        header.check_dimensions()?;
        if payload.len() != header.payload_size() as usize {
            return Err(FrameError::IncompleteImage {
                received: payload.len(),
                expected: header.payload_size() as usize,
            });
        }
        let pixels = payload
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| u16::from_le_bytes([px[0], px[1]]))
            .collect();
        Ok(Self { header, pixels })
    }

    /// Replace the header's plane indices.
    pub fn with_planes(mut self, start: u32, stop: u32) -> Self {
        self.header = self.header.with_planes(start, stop);
        self
    }

    pub fn width(&self) -> u32 {
        self.header.width()
    }

    pub fn height(&self) -> u32 {
        self.header.height()
    }

    /// Row-major pixel samples.
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }

    /// Consume the frame and return the pixel buffer.
    pub fn into_pixels(self) -> Vec<u16> {
        self.pixels
    }

    /// Sample at `(row, col)`, or `None` outside the image.
    pub fn pixel(&self, row: u32, col: u32) -> Option<u16> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        let idx = row as usize * self.width() as usize + col as usize;
        self.pixels.get(idx).copied()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u16]> {
        // chunks_exact panics on 0; a zero-width image has no rows to yield.
        let width = (self.width() as usize).max(1);
        self.pixels.chunks_exact(width)
    }

    /// Append header and pixel payload in wire form to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(IMAGE_HEADER_SIZE + self.pixels.len() * BYTES_PER_PIXEL);
        self.header.encode(dst);
        for px in &self.pixels {
            dst.put_u16_le(*px);
        }
    }
}
