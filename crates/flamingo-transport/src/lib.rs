//! TCP transport for the Flamingo control computer.
//!
//! The microscope's NUC exposes two plain TCP ports: one for command frames
//! and one for live image data. This crate owns the socket plumbing for both:
//! - [`TcpTransport`] binds listeners and opens client connections
//! - [`NucStream`] is the connected stream handed to the framing layer
//!
//! This is the lowest layer. Everything else builds on top of [`NucStream`].

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NucStream;
pub use tcp::TcpTransport;
