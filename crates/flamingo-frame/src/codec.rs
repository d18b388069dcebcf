use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::{CommandFrame, Response, COMMAND_FRAME_SIZE};
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::image::{ImageFrame, ImageHeader, IMAGE_HEADER_SIZE};

/// `tokio_util` codec for the command channel.
///
/// Decodes a frame and its trailing payload as one [`Response`]. Encodes
/// bare frames (which must declare no trailing bytes) or whole responses.
#[derive(Debug, Clone, Default)]
pub struct CommandCodec {
    config: FrameConfig,
    pending: Option<CommandFrame>,
}

impl CommandCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }
}

impl Decoder for CommandCodec {
    type Item = Response;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let frame = match self.pending {
            Some(frame) => frame,
            None => {
                if src.len() < COMMAND_FRAME_SIZE {
                    src.reserve(COMMAND_FRAME_SIZE - src.len());
                    return Ok(None);
                }
                let frame = CommandFrame::decode(&src[..COMMAND_FRAME_SIZE])?;
                let len = frame.additional_data_bytes as usize;
                if len > self.config.max_payload_size {
                    return Err(FrameError::PayloadTooLarge {
                        size: len,
                        max: self.config.max_payload_size,
                    });
                }
                src.advance(COMMAND_FRAME_SIZE);
                self.pending = Some(frame);
                frame
            }
        };

        let len = frame.additional_data_bytes as usize;
        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        self.pending = None;
        let payload = src.split_to(len).freeze();
        Ok(Some(Response { frame, payload }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() && self.pending.is_none() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<CommandFrame> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: CommandFrame, dst: &mut BytesMut) -> Result<()> {
        if frame.additional_data_bytes != 0 {
            return Err(FrameError::PayloadLengthMismatch {
                declared: frame.additional_data_bytes,
                actual: 0,
            });
        }
        frame.encode(dst);
        Ok(())
    }
}

impl Encoder<Response> for CommandCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<()> {
        if item.frame.additional_data_bytes as usize != item.payload.len() {
            return Err(FrameError::PayloadLengthMismatch {
                declared: item.frame.additional_data_bytes,
                actual: item.payload.len(),
            });
        }
        if item.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        item.frame.encode(dst);
        dst.put_slice(&item.payload);
        Ok(())
    }
}

/// `tokio_util` codec for the live image channel.
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    config: FrameConfig,
    pending: Option<ImageHeader>,
}

impl ImageCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }
}

impl Decoder for ImageCodec {
    type Item = ImageFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let header = match self.pending {
            Some(header) => header,
            None => {
                if src.len() < IMAGE_HEADER_SIZE {
                    return Ok(None);
                }
                let header = ImageHeader::decode(&src[..IMAGE_HEADER_SIZE])?;
                let size = header.payload_size() as usize;
                if size > self.config.max_image_size {
                    return Err(FrameError::PayloadTooLarge {
                        size,
                        max: self.config.max_image_size,
                    });
                }
                src.advance(IMAGE_HEADER_SIZE);
                self.pending = Some(header);
                header
            }
        };

        let size = header.payload_size() as usize;
        if src.len() < size {
            src.reserve(size - src.len());
            return Ok(None);
        }

        self.pending = None;
        let payload = src.split_to(size);
        ImageFrame::from_payload(header, &payload).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        match self.pending {
            Some(header) => Err(FrameError::IncompleteImage {
                received: src.len(),
                expected: header.payload_size() as usize,
            }),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::IncompleteHeader {
                received: src.len(),
                expected: IMAGE_HEADER_SIZE,
            }),
        }
    }
}

impl Encoder<ImageFrame> for ImageCodec {
    type Error = FrameError;

    fn encode(&mut self, image: ImageFrame, dst: &mut BytesMut) -> Result<()> {
        image.encode(dst);
        Ok(())
    }
}
