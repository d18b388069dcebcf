use std::io::Write;

use bytes::{BufMut, BytesMut};
use flamingo_transport::NucStream;
use tracing::debug;

use crate::command::{CommandFrame, COMMAND_FRAME_SIZE};
use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::image::ImageFrame;
use crate::io::{flush, transport_to_frame_error, write_full};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete command frames to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new command writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a frame with no trailing payload (blocking).
    ///
    /// The frame must declare `additional_data_bytes == 0`; anything else
    /// would leave the peer waiting for bytes that never come.
    pub fn write_frame(&mut self, frame: &CommandFrame) -> Result<()> {
        self.write_with_payload(frame, &[])
    }

    /// Write a frame immediately followed by its trailing payload (blocking).
    ///
    /// `frame.additional_data_bytes` must equal `payload.len()`.
    pub fn write_with_payload(&mut self, frame: &CommandFrame, payload: &[u8]) -> Result<()> {
        if frame.additional_data_bytes as usize != payload.len() {
            return Err(FrameError::PayloadLengthMismatch {
                declared: frame.additional_data_bytes,
                actual: payload.len(),
            });
        }
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        self.buf.reserve(COMMAND_FRAME_SIZE + payload.len());
        frame.encode(&mut self.buf);
        self.buf.put_slice(payload);

        write_full(&mut self.inner, &self.buf)?;
        self.flush()?;

        debug!(
            command = frame.command,
            payload = payload.len(),
            "wrote command frame"
        );
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        flush(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl CommandWriter<NucStream> {
    /// Create a command writer for `NucStream` and apply write timeout from config.
    pub fn with_config_nuc(inner: NucStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Writes images in live-channel wire form. Used by the controller side.
pub struct ImageWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> ImageWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write header and pixels (blocking).
    pub fn write_image(&mut self, image: &ImageFrame) -> Result<()> {
        self.buf.clear();
        image.encode(&mut self.buf);
        write_full(&mut self.inner, &self.buf)?;
        flush(&mut self.inner)
    }

    /// Write raw bytes as-is. Lets simulators emit malformed or partial
    /// images.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        write_full(&mut self.inner, bytes)?;
        flush(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::image::{ImageHeader, IMAGE_HEADER_SIZE};
    use crate::reader::{CommandReader, ImageReader};

    #[test]
    fn write_single_frame() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = CommandFrame::new(4105).with_params([1, 2, 3]);
        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), COMMAND_FRAME_SIZE);
        assert_eq!(CommandFrame::decode(&wire).unwrap(), frame);
    }

    #[test]
    fn write_frame_with_workflow() {
        let body = b"Stack Settings\nNumber of planes = 10\n";
        let frame = CommandFrame::new(12292).with_additional_bytes(body.len() as u32);

        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_with_payload(&frame, body).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), COMMAND_FRAME_SIZE + body.len());
        assert_eq!(&wire[COMMAND_FRAME_SIZE..], body);

        let mut reader = CommandReader::new(Cursor::new(wire));
        let response = reader.read_frame().unwrap();
        assert_eq!(response.frame, frame);
        assert_eq!(response.payload.as_ref(), body);
    }

    #[test]
    fn declared_count_must_match_payload() {
        let mut writer = CommandWriter::new(Cursor::new(Vec::<u8>::new()));

        let err = writer
            .write_frame(&CommandFrame::new(1).with_additional_bytes(4))
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadLengthMismatch {
                declared: 4,
                actual: 0
            }
        ));

        let err = writer
            .write_with_payload(&CommandFrame::new(1), b"abc")
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadLengthMismatch { .. }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = CommandWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);
        let frame = CommandFrame::new(1).with_additional_bytes(9);
        let err = writer.write_with_payload(&frame, b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = CommandWriter::new(sink);

        writer.write_frame(&CommandFrame::new(1)).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = CommandWriter::new(writer_impl);
        writer.write_frame(&CommandFrame::new(5)).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), COMMAND_FRAME_SIZE);
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = CommandWriter::new(TrickleWriter { data: Vec::new() });
        let frame = CommandFrame::new(3).with_additional_bytes(5);
        writer.write_with_payload(&frame, b"hello").unwrap();
        assert_eq!(writer.into_inner().data.len(), COMMAND_FRAME_SIZE + 5);
    }

    #[test]
    fn reset_peer_surfaces_io_error() {
        let mut writer = CommandWriter::new(ResetWriter);
        let err = writer.write_frame(&CommandFrame::new(1)).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = CommandWriter::new(ZeroWriter);
        let err = writer.write_frame(&CommandFrame::new(1)).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn image_writer_roundtrip() {
        let image = ImageFrame::new(3, 1, vec![10, 20, 30])
            .unwrap()
            .with_planes(4, 8);
        let mut writer = ImageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_image(&image).unwrap();
        writer.write_image(&image).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 2 * (IMAGE_HEADER_SIZE + 6));

        let mut reader = ImageReader::new(Cursor::new(wire));
        assert_eq!(reader.read_image().unwrap(), image);
        assert_eq!(reader.read_image().unwrap(), image);
    }

    #[test]
    fn image_writer_raw_partial() {
        let mut wire = BytesMut::new();
        ImageHeader::new(2, 2).encode(&mut wire);
        let mut writer = ImageWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_raw(&wire[..10]).unwrap();
        assert_eq!(writer.get_ref().get_ref().len(), 10);
    }

    #[test]
    fn applies_write_timeout_for_nuc_stream() {
        let listener = flamingo_transport::TcpTransport::bind("127.0.0.1:0").unwrap();
        let stream = flamingo_transport::TcpTransport::connect(listener.local_addr()).unwrap();
        let _server = listener.accept().unwrap();

        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = CommandWriter::with_config_nuc(stream, cfg);
        assert!(writer.is_ok());
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    /// Accepts at most three bytes per call.
    struct TrickleWriter {
        data: Vec<u8>,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ResetWriter;

    impl Write for ResetWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
