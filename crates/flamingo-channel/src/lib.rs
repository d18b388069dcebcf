//! Command and live image channels to the Flamingo NUC.
//!
//! This is the "just works" layer. Each channel owns one TCP socket for the
//! lifetime of a session: connect, exchange whole frames, disconnect. The two
//! channels are independent and are normally driven from separate threads,
//! since both `receive` and `read_next_image` block.
//!
//! Nothing here retries. Resending a command such as a workflow start without
//! the operator knowing is unsafe, so every failure goes back to the caller.

pub mod cancel;
pub mod command;
pub mod config;
pub mod connector;
pub mod error;
pub mod live;
pub mod server;

pub use cancel::CancelHandle;
pub use command::CommandChannel;
pub use config::{ChannelConfig, ConnectionTarget};
pub use connector::{connect, connect_with_config};
pub use error::{ChannelError, Result};
pub use live::{Images, LiveImageChannel};
pub use server::{CommandSession, LiveSession, NucListener};
