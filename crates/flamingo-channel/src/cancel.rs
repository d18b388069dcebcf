use std::sync::Arc;

use flamingo_transport::NucStream;
use tracing::debug;

use crate::error::Result;

/// Hard-closes a channel's socket from another thread.
///
/// This is the only way to interrupt a blocked `receive` or
/// `read_next_image`; the blocked call then returns `ChannelError::Io`.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    stream: Arc<NucStream>,
}

impl CancelHandle {
    pub(crate) fn new(stream: Arc<NucStream>) -> Self {
        Self { stream }
    }

    /// Shut the socket down in both directions. Safe to call repeatedly.
    pub fn cancel(&self) -> Result<()> {
        debug!("cancelling channel");
        self.stream.shutdown()?;
        Ok(())
    }
}
