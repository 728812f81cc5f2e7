//! Terminal implementations of the picker and launcher capabilities

use std::fmt;
use std::process::{Command, Stdio};

use arenactl_core::{ArenaError, Block, Channel, Launcher, Picker, Result};
use inquire::{InquireError, Select};
use tracing::debug;

const PAGE_SIZE: usize = 15;

/// Fuzzy-searchable selection lists backed by `inquire`
pub struct TerminalPicker;

struct ChannelChoice(Channel);

impl fmt::Display for ChannelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} blocks)", self.0.title, self.0.length)?;
        if self.0.is_private() {
            write!(f, " · private")?;
        }
        Ok(())
    }
}

struct BlockChoice(Block);

impl fmt::Display for BlockChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} · {}", self.0.display_title(), self.0.class.as_str())
    }
}

fn prompt_error(err: InquireError) -> ArenaError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            ArenaError::Cancelled
        }
        InquireError::NotTTY => {
            ArenaError::config("this command needs an interactive terminal to choose from a list")
        }
        InquireError::IO(e) => ArenaError::Io { source: e },
        other => ArenaError::config(other.to_string()),
    }
}

impl Picker for TerminalPicker {
    fn pick_channel(&self, prompt: &str, channels: &[Channel]) -> Result<Channel> {
        let options = channels.iter().cloned().map(ChannelChoice).collect();
        Select::new(prompt, options)
            .with_page_size(PAGE_SIZE)
            .prompt()
            .map(|choice| choice.0)
            .map_err(prompt_error)
    }

    fn pick_block(&self, channel: &Channel, blocks: &[Block]) -> Result<Block> {
        let prompt = format!("Search blocks in {}", channel.title);
        let options = blocks.iter().cloned().map(BlockChoice).collect();
        Select::new(&prompt, options)
            .with_page_size(PAGE_SIZE)
            .prompt()
            .map(|choice| choice.0)
            .map_err(prompt_error)
    }
}

/// Opens URLs with the platform's default handler
pub struct BrowserLauncher;

impl BrowserLauncher {
    fn opener() -> (&'static str, &'static [&'static str]) {
        if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        }
    }
}

impl Launcher for BrowserLauncher {
    fn open_url(&self, url: &str) -> Result<()> {
        let (program, args) = Self::opener();
        let path = which::which(program).map_err(|_| {
            ArenaError::config(format!("'{}' not found; open {} manually", program, url))
        })?;

        debug!(opener = %path.display(), url, "launching browser");
        Command::new(path)
            .args(args)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}
