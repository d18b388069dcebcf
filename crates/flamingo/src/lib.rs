//! Client for the Flamingo light-sheet microscope controller (the "NUC").
//!
//! The NUC exposes two TCP ports: a command port carrying fixed 128-byte
//! command frames (optionally followed by raw bytes, e.g. a workflow file),
//! and a live port streaming camera images as a 40-byte header plus 16-bit
//! pixels.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP sockets to the NUC
//! - [`frame`]: command frame and image wire formats, command catalog
//! - [`channel`]: command and live image channels, controller-side sessions
//!
//! ```no_run
//! use flamingo::channel::{connect, ConnectionTarget};
//! use flamingo::frame::CommandFrame;
//!
//! let target = ConnectionTarget::new("192.168.1.10", 53717);
//! let (mut commands, mut images) = connect(&target)?;
//! let response = commands.request(&CommandFrame::new(24580).with_params([1, 0, 0]).with_value(2.5))?;
//! println!("status {}", response.frame.status);
//! let image = images.read_next_image()?;
//! println!("{}x{}", image.width(), image.height());
//! # Ok::<(), flamingo::channel::ChannelError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use flamingo_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use flamingo_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use flamingo_channel::*;
}
