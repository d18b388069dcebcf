use std::time::Duration;

/// Default maximum trailing payload after a command frame: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default maximum image payload: 256 MiB (a 2048x2048 16-bit frame is 8 MiB).
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 256 * 1024 * 1024;

/// Configuration shared by the frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum trailing payload after a command frame. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Maximum image payload on the live channel. Default: 256 MiB.
    pub max_image_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
