pub mod api;
pub mod attachments;
pub mod commands;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod host;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod vault;

pub use api::{ArenaApi, BlockDraft, CONTENTS_PAGE_CAP};
pub use commands::{ArenaSync, ChannelPullReport, PushOutcome};
pub use config::{DownloadMode, Settings, SettingsStore, TomlSettingsStore};
pub use error::{ArenaError, Result};
pub use frontmatter::NoteDoc;
pub use host::{Host, Launcher, Notifier, Picker};
pub use model::{Attachment, Block, BlockClass, Channel};
pub use reconcile::{Reconciler, TrackedNote, WriteAction, WriteOutcome};
pub use vault::{FileStore, FsVault};
