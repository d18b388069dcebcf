/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A command frame buffer was not exactly 128 bytes.
    #[error("invalid command frame length ({actual} bytes, expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    /// The start marker did not match `0xF321E654`.
    #[error("invalid start marker 0x{0:08X} (expected 0xF321E654)")]
    InvalidStartMarker(u32),

    /// The end marker did not match `0xFEDC4321`.
    #[error("invalid end marker 0x{0:08X} (expected 0xFEDC4321)")]
    InvalidEndMarker(u32),

    /// A trailing payload or image exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame's additional byte count disagrees with the attached payload.
    #[error("additional byte count {declared} does not match payload length {actual}")]
    PayloadLengthMismatch { declared: u32, actual: usize },

    /// An image header's payload size disagrees with its dimensions.
    #[error("image payload {payload_size} bytes does not match {width}x{height} 16-bit pixels")]
    ImageSizeMismatch {
        payload_size: u32,
        width: u32,
        height: u32,
    },

    /// The stream closed before a full image header arrived.
    #[error("incomplete header ({received} of {expected} bytes)")]
    IncompleteHeader { received: usize, expected: usize },

    /// The stream closed before the full image payload arrived.
    #[error("incomplete image data ({received} of {expected} bytes)")]
    IncompleteImage { received: usize, expected: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors meaning the byte stream is out of sync with the
    /// protocol. Reading on after one of these would treat garbage as frames.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidLength { .. }
                | FrameError::InvalidStartMarker(_)
                | FrameError::InvalidEndMarker(_)
                | FrameError::PayloadTooLarge { .. }
                | FrameError::ImageSizeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_classification() {
        assert!(FrameError::InvalidStartMarker(0).is_decode());
        assert!(FrameError::InvalidEndMarker(0).is_decode());
        assert!(FrameError::InvalidLength {
            expected: 128,
            actual: 3
        }
        .is_decode());
        assert!(!FrameError::ConnectionClosed.is_decode());
        assert!(!FrameError::IncompleteHeader {
            received: 1,
            expected: 40
        }
        .is_decode());
        assert!(!FrameError::Io(std::io::Error::other("boom")).is_decode());
    }

    #[test]
    fn marker_message_is_hex() {
        let text = FrameError::InvalidStartMarker(0xDEADBEEF).to_string();
        assert!(text.contains("0xDEADBEEF"));
    }
}
