//! Interactive capabilities the orchestrator borrows from its front end

use crate::error::Result;
use crate::model::{Block, Channel};

/// Searchable selection lists
pub trait Picker: Send + Sync {
    /// Let the user choose one of `channels`. Dismissal is
    /// [`ArenaError::Cancelled`](crate::ArenaError::Cancelled).
    fn pick_channel(&self, prompt: &str, channels: &[Channel]) -> Result<Channel>;

    fn pick_block(&self, channel: &Channel, blocks: &[Block]) -> Result<Block>;
}

/// Short, transient messages to the user
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// Opens web pages outside the tool
pub trait Launcher: Send + Sync {
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Front-end capabilities passed to every orchestrator action
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub picker: &'a dyn Picker,
    pub notifier: &'a dyn Notifier,
    pub launcher: &'a dyn Launcher,
}

impl<'a> Host<'a> {
    pub fn new(
        picker: &'a dyn Picker,
        notifier: &'a dyn Notifier,
        launcher: &'a dyn Launcher,
    ) -> Self {
        Self {
            picker,
            notifier,
            launcher,
        }
    }

    pub fn notice(&self, message: impl AsRef<str>) {
        self.notifier.notice(message.as_ref());
    }
}
