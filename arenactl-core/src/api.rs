//! The remote operations arenactl needs from Are.na.
//!
//! `arenactl-client` implements this over HTTP; tests substitute a scripted
//! implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::frontmatter::strip_frontmatter_regions;
use crate::model::{Block, Channel};

/// Maximum number of blocks requested from a channel in one call
pub const CONTENTS_PAGE_CAP: usize = 1000;

/// Title, content and description sent when creating or updating a block
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct BlockDraft {
    pub title: String,
    pub content: String,
    /// Left out of the request when absent so a remote description survives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BlockDraft {
    /// Build a draft, removing any frontmatter regions from the content
    pub fn new(
        title: impl Into<String>,
        content: &str,
        description: Option<impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            content: strip_frontmatter_regions(content),
            description: description.map(Into::into),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.description.as_deref().map_or(true, |d| d.trim().is_empty())
            && self.content.is_empty()
    }
}

#[async_trait]
pub trait ArenaApi: Send + Sync {
    /// Every channel of `username`, across all pages
    async fn list_channels_for_user(&self, username: &str) -> Result<Vec<Channel>>;

    /// Up to [`CONTENTS_PAGE_CAP`] blocks of a channel
    async fn list_blocks_in_channel(&self, slug: &str) -> Result<Vec<Block>>;

    async fn get_block(&self, id: u64) -> Result<Block>;

    /// `Ok(None)` when the draft is empty and nothing was sent
    async fn create_block(&self, channel_slug: &str, draft: &BlockDraft) -> Result<Option<Block>>;

    async fn update_block(&self, id: u64, draft: &BlockDraft) -> Result<()>;

    /// Raw bytes of an attachment or image
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
