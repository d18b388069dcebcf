use std::io::Read;

use bytes::BytesMut;
use flamingo_transport::NucStream;
use tracing::debug;

use crate::command::{CommandFrame, Response, COMMAND_FRAME_SIZE};
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::image::{ImageFrame, ImageHeader, IMAGE_HEADER_SIZE};
use crate::io::{read_full, transport_to_frame_error};

/// Reads complete command frames, with their trailing payloads, from any
/// `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct CommandReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> CommandReader<T> {
    /// Create a new command reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new command reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame and exactly `additional_data_bytes` trailing bytes
    /// (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` if EOF arrives anywhere
    /// before the message is complete.
    pub fn read_frame(&mut self) -> Result<Response> {
        let mut raw = [0u8; COMMAND_FRAME_SIZE];
        if read_full(&mut self.inner, &mut raw)? < COMMAND_FRAME_SIZE {
            return Err(FrameError::ConnectionClosed);
        }
        let frame = CommandFrame::decode(&raw)?;

        let len = frame.additional_data_bytes as usize;
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }

        let mut payload = BytesMut::zeroed(len);
        if read_full(&mut self.inner, &mut payload)? < len {
            return Err(FrameError::ConnectionClosed);
        }

        debug!(
            command = frame.command,
            status = frame.status,
            payload = len,
            "read command frame"
        );
        Ok(Response {
            frame,
            payload: payload.freeze(),
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl CommandReader<NucStream> {
    /// Create a command reader for `NucStream` and apply read timeout from config.
    pub fn with_config_nuc(inner: NucStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Reads complete images from the live data stream.
pub struct ImageReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> ImageReader<T> {
    /// Create a new image reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new image reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next header and its full pixel payload (blocking).
    ///
    /// EOF before any header byte is `ConnectionClosed`; EOF inside the header
    /// is `IncompleteHeader`; EOF inside the payload is `IncompleteImage`.
    /// A header whose payload disagrees with its dimensions is rejected only
    /// after the payload is drained, so the next read starts on a header.
    pub fn read_image(&mut self) -> Result<ImageFrame> {
        let mut raw = [0u8; IMAGE_HEADER_SIZE];
        let got = read_full(&mut self.inner, &mut raw)?;
        if got == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        if got < IMAGE_HEADER_SIZE {
            return Err(FrameError::IncompleteHeader {
                received: got,
                expected: IMAGE_HEADER_SIZE,
            });
        }
        let header = ImageHeader::decode(&raw)?;

        let size = header.payload_size() as usize;
        if size > self.config.max_image_size {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.config.max_image_size,
            });
        }

        let mut payload = vec![0u8; size];
        let got = read_full(&mut self.inner, &mut payload)?;
        if got < size {
            return Err(FrameError::IncompleteImage {
                received: got,
                expected: size,
            });
        }

        let image = ImageFrame::from_payload(header, &payload)?;
        debug!(
            width = image.width(),
            height = image.height(),
            start = header.start_index(),
            stop = header.stop_index(),
            "read image"
        );
        Ok(image)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl ImageReader<NucStream> {
    /// Create an image reader for `NucStream` and apply read timeout from config.
    pub fn with_config_nuc(inner: NucStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
