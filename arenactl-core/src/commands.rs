//! The user-facing sync actions.
//!
//! Each action is one short chain over [`ArenaApi`] and [`Reconciler`]:
//! check settings, read the note or prompt, call Are.na, write the result.
//! Success notices go through the [`Host`]; failures are returned so the
//! front end decides how loudly to report them.

use std::sync::Arc;

use serde_yaml::Mapping;
use tracing::{error, info, instrument};

use crate::api::{ArenaApi, BlockDraft};
use crate::config::Settings;
use crate::error::{ArenaError, Result};
use crate::frontmatter::{
    metadata_from_block, NoteDoc, KEY_BLOCK_ID, KEY_CHANNEL, KEY_DESCRIPTION, KEY_TITLE, KEY_USER,
};
use crate::host::Host;
use crate::model::{sort_by_position_desc, Block, Channel};
use crate::naming::{join, parse_block_ref, permalink, stem};
use crate::reconcile::{Reconciler, TrackedNote, WriteAction, WriteOutcome};
use crate::vault::FileStore;

/// What `push` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Existing block overwritten with the note
    Updated { id: u64 },
    /// New block created in `channel` and its id written back to the note
    Created { id: u64, channel: String },
    /// Note body was empty; nothing was sent
    Empty,
}

/// Result of turning a channel into notes
#[derive(Debug, Clone)]
pub struct ChannelPullReport {
    pub channel: Channel,
    pub written: Vec<WriteOutcome>,
    /// Sub-channels and media blocks
    pub skipped: usize,
    pub failed: usize,
}

impl ChannelPullReport {
    pub fn created(&self) -> usize {
        self.written
            .iter()
            .filter(|w| w.action == WriteAction::Created)
            .count()
    }
}

pub struct ArenaSync {
    settings: Settings,
    api: Arc<dyn ArenaApi>,
    store: Arc<dyn FileStore>,
    reconciler: Reconciler,
}

impl ArenaSync {
    pub fn new(settings: Settings, api: Arc<dyn ArenaApi>, store: Arc<dyn FileStore>) -> Self {
        let reconciler = Reconciler::new(store.clone(), api.clone(), settings.clone());
        Self {
            settings,
            api,
            store,
            reconciler,
        }
    }

    /// Send a note to Are.na: update its block when it has one, otherwise
    /// create a block in a channel the user picks.
    #[instrument(skip(self, host))]
    pub async fn push(&self, host: Host<'_>, note: &str) -> Result<PushOutcome> {
        self.settings.ensure_ready()?;
        let text = self.store.read(note).await?;
        let doc = NoteDoc::parse(&text)?;

        let title = doc
            .get_str(KEY_TITLE)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| stem(note).to_string());
        let draft = BlockDraft::new(title, &text, doc.get_str(KEY_DESCRIPTION));

        if draft.content.trim().is_empty() {
            host.notice("Nothing to push: the note is empty");
            return Ok(PushOutcome::Empty);
        }

        if let Some(id) = linked_block(&doc, note)? {
            let owner = doc.get_str(KEY_USER).unwrap_or_default();
            if owner != self.settings.username {
                let owner = if owner.is_empty() {
                    "another user".to_string()
                } else {
                    owner
                };
                return Err(ArenaError::PermissionDenied { owner });
            }

            self.api.update_block(id, &draft).await?;
            info!(id, note, "block updated");
            host.notice("Block updated");
            return Ok(PushOutcome::Updated { id });
        }

        let channels = self.channels(false).await?;
        let prompt = format!("Push to one of @{}'s channels", self.settings.username);
        let channel = host.picker.pick_channel(&prompt, &channels)?;

        let Some(block) = self.api.create_block(&channel.slug, &draft).await? else {
            host.notice("Nothing to push: the note is empty");
            return Ok(PushOutcome::Empty);
        };

        let mut link = Mapping::new();
        link.insert(KEY_BLOCK_ID.into(), block.id.into());
        link.insert(KEY_CHANNEL.into(), permalink(&channel.title).into());
        link.insert(KEY_USER.into(), self.settings.username.clone().into());

        // Re-read so edits made while the picker was open are kept
        let mut doc = NoteDoc::parse(&self.store.read(note).await?)?;
        doc.merge(&link);
        self.store.write(note, &doc.render()?).await?;

        info!(id = block.id, channel = %channel.slug, note, "block created");
        host.notice(format!("Block created in {}", channel.title));
        Ok(PushOutcome::Created {
            id: block.id,
            channel: channel.slug,
        })
    }

    /// Refresh a note from its block and move it to the block's title.
    /// Returns the note's new path.
    #[instrument(skip(self, host))]
    pub async fn pull(&self, host: Host<'_>, note: &str) -> Result<String> {
        self.settings.ensure_ready()?;
        let doc = NoteDoc::parse(&self.store.read(note).await?)?;
        let id = linked_block(&doc, note)?.ok_or_else(|| ArenaError::missing_block_id(note))?;

        let block = self.api.get_block(id).await?;
        let channel = doc.get_str(KEY_CHANNEL);
        let meta = metadata_from_block(&block, channel.as_deref());
        let attachment = self.attachment_for(&block);

        let path = self
            .reconciler
            .rename_into_channel(
                note,
                &block.display_title(),
                &block.note_body(),
                &meta,
                attachment.as_ref(),
            )
            .await?;

        host.notice(format!("Block pulled into {}", path));
        Ok(path)
    }

    /// Write every block of a channel into `<folder>/<channel>/`.
    ///
    /// With `slug` the channel is looked up directly; otherwise the user
    /// picks one of their non-empty channels.
    #[instrument(skip(self, host))]
    pub async fn pull_channel(
        &self,
        host: Host<'_>,
        slug: Option<&str>,
    ) -> Result<ChannelPullReport> {
        self.settings.ensure_ready()?;
        let channels = self.channels(true).await?;
        let channel = match slug {
            Some(slug) => channels
                .into_iter()
                .find(|c| c.slug == slug)
                .ok_or_else(|| ArenaError::NotFound {
                    resource: format!("channel '{}'", slug),
                })?,
            None => {
                let prompt = format!("Search @{}'s channels", self.settings.username);
                host.picker.pick_channel(&prompt, &channels)?
            }
        };

        host.notice(format!("Getting blocks from {}…", channel.title));
        let mut blocks = self.api.list_blocks_in_channel(&channel.slug).await?;
        sort_by_position_desc(&mut blocks);

        let channel_name = permalink(&channel.title);
        let folder = join(&[&self.settings.folder, &channel_name]);

        let mut report = ChannelPullReport {
            channel,
            written: Vec::new(),
            skipped: 0,
            failed: 0,
        };

        for block in &blocks {
            if !block.class.is_note() {
                report.skipped += 1;
                continue;
            }
            match self.write_block(&folder, block, Some(&channel_name)).await {
                Ok(outcome) => report.written.push(outcome),
                Err(e) => {
                    error!(id = block.id, error = %e, "failed to write block");
                    host.notice(format!("Error creating file for block {}: {}", block.id, e));
                    report.failed += 1;
                }
            }
        }

        let created = report.created();
        let updated = report.written.len() - created;
        let mut summary = format!("{} note{} created", created, plural(created));
        if updated > 0 {
            summary.push_str(&format!(", {} updated", updated));
        }
        host.notice(summary);
        Ok(report)
    }

    /// Open the block page of a note in the browser. Returns the URL.
    #[instrument(skip(self, host))]
    pub async fn open_remote(&self, host: Host<'_>, note: &str) -> Result<String> {
        self.settings.ensure_ready()?;
        let doc = NoteDoc::parse(&self.store.read(note).await?)?;
        let id = linked_block(&doc, note)?.ok_or_else(|| ArenaError::missing_block_id(note))?;

        let url = format!("{}/block/{}", self.settings.web_base.trim_end_matches('/'), id);
        host.launcher.open_url(&url)?;
        Ok(url)
    }

    /// Fetch a block by id or URL into the root folder
    #[instrument(skip(self, host))]
    pub async fn fetch_block(&self, host: Host<'_>, input: &str) -> Result<WriteOutcome> {
        self.settings.ensure_ready()?;
        let id = parse_block_ref(input)?;
        let block = self.api.get_block(id).await?;

        let outcome = self.write_block(&self.settings.folder, &block, None).await?;
        host.notice(written_notice(&outcome));
        Ok(outcome)
    }

    /// Pick a channel, then one of its blocks, and write it into the
    /// channel folder
    #[instrument(skip(self, host))]
    pub async fn pick_block(&self, host: Host<'_>) -> Result<WriteOutcome> {
        self.settings.ensure_ready()?;
        let channels = self.channels(true).await?;
        let prompt = format!("Search @{}'s channels", self.settings.username);
        let channel = host.picker.pick_channel(&prompt, &channels)?;

        let mut blocks = self.api.list_blocks_in_channel(&channel.slug).await?;
        sort_by_position_desc(&mut blocks);
        blocks.retain(|b| b.class.is_note());
        if blocks.is_empty() {
            return Err(ArenaError::NotFound {
                resource: format!("blocks in {}", channel.title),
            });
        }

        let block = host.picker.pick_block(&channel, &blocks)?;
        let channel_name = permalink(&channel.title);
        let folder = join(&[&self.settings.folder, &channel_name]);

        let outcome = self.write_block(&folder, &block, Some(&channel_name)).await?;
        host.notice(written_notice(&outcome));
        Ok(outcome)
    }

    /// Notes linked to blocks in the root folder, or in one channel folder
    pub async fn tracked(&self, channel_folder: Option<&str>) -> Result<Vec<TrackedNote>> {
        let folder = match channel_folder {
            Some(sub) => join(&[&self.settings.folder, sub]),
            None => self.settings.folder.clone(),
        };
        self.reconciler.tracked_notes(&folder).await
    }

    async fn write_block(
        &self,
        folder: &str,
        block: &Block,
        channel: Option<&str>,
    ) -> Result<WriteOutcome> {
        let meta = metadata_from_block(block, channel);
        let attachment = self.attachment_for(block);
        self.reconciler
            .write_note(
                folder,
                &block.display_title(),
                &block.note_body(),
                &meta,
                attachment.as_ref(),
            )
            .await
    }

    fn attachment_for(&self, block: &Block) -> Option<crate::model::Attachment> {
        if self.settings.downloads_enabled() {
            block.attachment_source()
        } else {
            None
        }
    }

    /// The user's channels; `non_empty` hides channels without items
    async fn channels(&self, non_empty: bool) -> Result<Vec<Channel>> {
        let mut channels = self
            .api
            .list_channels_for_user(&self.settings.username)
            .await?;
        if non_empty {
            channels.retain(|c| c.length > 0);
        }
        if channels.is_empty() {
            return Err(ArenaError::NotFound {
                resource: format!("channels of @{}", self.settings.username),
            });
        }
        Ok(channels)
    }
}

/// `blockid` of a note; a present but non-numeric id is an error rather
/// than "not linked", so a damaged note is never pushed as a new block.
fn linked_block(doc: &NoteDoc, note: &str) -> Result<Option<u64>> {
    match (doc.meta.get(KEY_BLOCK_ID), doc.blockid()) {
        (None, _) => Ok(None),
        (Some(_), Some(id)) => Ok(Some(id)),
        (Some(_), None) => Err(ArenaError::config(format!(
            "{} has a blockid that is not a number",
            note
        ))),
    }
}

fn written_notice(outcome: &WriteOutcome) -> String {
    match outcome.action {
        WriteAction::Created => format!("Block created: {}", outcome.path),
        WriteAction::Updated => format!("Block updated: {}", outcome.path),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
