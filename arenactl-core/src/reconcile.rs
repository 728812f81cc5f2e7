//! Writing blocks into notes without clobbering unrelated notes.
//!
//! A note is matched to a block by the `blockid` in its frontmatter. When
//! the wanted file name belongs to a different block, the next free
//! `<name>-<n>` is used instead, unless one of those already carries the
//! incoming block, in which case that note is updated.

use std::sync::Arc;

use serde_yaml::Mapping;
use tracing::{debug, info, warn};

use crate::api::ArenaApi;
use crate::attachments::{embed, materialize};
use crate::config::Settings;
use crate::error::{ArenaError, Result};
use crate::frontmatter::{blockid_of, string_of, NoteDoc, KEY_CHANNEL};
use crate::model::Attachment;
use crate::naming::{join, note_path, safe_filename};
use crate::vault::FileStore;

/// Upper bound on `<name>-<n>` candidates tried before giving up
pub const MAX_NAME_PROBES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: String,
    pub action: WriteAction,
}

/// A note in a folder that is linked to a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedNote {
    pub path: String,
    pub name: String,
    pub blockid: u64,
}

fn same_block(stored: Option<u64>, incoming: Option<u64>) -> bool {
    matches!((stored, incoming), (Some(a), Some(b)) if a == b)
}

pub struct Reconciler {
    store: Arc<dyn FileStore>,
    api: Arc<dyn ArenaApi>,
    settings: Settings,
}

impl Reconciler {
    pub fn new(store: Arc<dyn FileStore>, api: Arc<dyn ArenaApi>, settings: Settings) -> Self {
        Self {
            store,
            api,
            settings,
        }
    }

    /// Write `content` and `meta` to `<folder>/<name>.md`.
    ///
    /// `meta` should carry `blockid`; without it an existing file is never
    /// treated as the same note.
    pub async fn write_note(
        &self,
        folder: &str,
        name: &str,
        content: &str,
        meta: &Mapping,
        attachment: Option<&Attachment>,
    ) -> Result<WriteOutcome> {
        let incoming = blockid_of(meta);
        let base = safe_filename(name);

        if !self.store.is_folder(folder).await {
            self.store.create_folder(folder).await?;
        }

        let path = note_path(folder, &base);
        if !self.store.exists(&path).await {
            let body = self.body_with_attachment(folder, &base, content, attachment).await;
            self.create_note(&path, &body, meta).await?;
            return Ok(WriteOutcome {
                path,
                action: WriteAction::Created,
            });
        }

        let stored = self.stored_blockid(&path).await;
        if same_block(stored, incoming) {
            let body = self.body_with_attachment(folder, &base, content, attachment).await;
            self.update_note(&path, &body, meta).await?;
            return Ok(WriteOutcome {
                path,
                action: WriteAction::Updated,
            });
        }

        debug!(path = %path, ?stored, ?incoming, "name taken by another block, probing");
        let (candidate, occupied) = self.find_next_available(folder, &base, incoming).await?;
        let path = note_path(folder, &candidate);
        let body = self
            .body_with_attachment(folder, &candidate, content, attachment)
            .await;

        if occupied {
            self.update_note(&path, &body, meta).await?;
            Ok(WriteOutcome {
                path,
                action: WriteAction::Updated,
            })
        } else {
            self.create_note(&path, &body, meta).await?;
            Ok(WriteOutcome {
                path,
                action: WriteAction::Created,
            })
        }
    }

    /// Overwrite an existing note, merge `meta` into it, then move it to
    /// `<root folder>/<channel>/<safe title>.md`. Returns the new path.
    pub async fn rename_into_channel(
        &self,
        current: &str,
        title: &str,
        content: &str,
        meta: &Mapping,
        attachment: Option<&Attachment>,
    ) -> Result<String> {
        let channel = string_of(meta, KEY_CHANNEL).unwrap_or_default();
        let folder = join(&[&self.settings.folder, &channel]);
        let base = safe_filename(title);

        let body = self.body_with_attachment(&folder, &base, content, attachment).await;
        self.update_note(current, &body, meta).await?;

        let target = note_path(&folder, &base);
        if target == current {
            return Ok(target);
        }

        if !self.store.is_folder(&folder).await {
            self.store.create_folder(&folder).await?;
        }
        let target = if self.store.exists(&target).await {
            self.next_vacant(&folder, &base).await?
        } else {
            target
        };

        self.store.rename(current, &target).await?;
        info!(from = %current, to = %target, "note renamed");
        Ok(target)
    }

    /// First of `<base>`, `<base>-1`, `<base>-2`, ... that is either free
    /// (`false`) or already holds `blockid` (`true`).
    pub async fn find_next_available(
        &self,
        folder: &str,
        base: &str,
        blockid: Option<u64>,
    ) -> Result<(String, bool)> {
        for counter in 0..MAX_NAME_PROBES {
            let candidate = if counter == 0 {
                base.to_string()
            } else {
                format!("{}-{}", base, counter)
            };
            let path = note_path(folder, &candidate);

            if !self.store.exists(&path).await {
                return Ok((candidate, false));
            }
            if same_block(self.stored_blockid(&path).await, blockid) {
                return Ok((candidate, true));
            }
        }

        Err(ArenaError::NameProbeExhausted {
            folder: folder.to_string(),
            base: base.to_string(),
            attempts: MAX_NAME_PROBES,
        })
    }

    async fn next_vacant(&self, folder: &str, base: &str) -> Result<String> {
        for counter in 1..MAX_NAME_PROBES {
            let path = note_path(folder, &format!("{}-{}", base, counter));
            if !self.store.exists(&path).await {
                return Ok(path);
            }
        }
        Err(ArenaError::NameProbeExhausted {
            folder: folder.to_string(),
            base: base.to_string(),
            attempts: MAX_NAME_PROBES,
        })
    }

    /// Notes directly inside `folder` that carry a numeric `blockid`
    pub async fn tracked_notes(&self, folder: &str) -> Result<Vec<TrackedNote>> {
        if !self.store.is_folder(folder).await {
            return Err(ArenaError::FolderNotFound {
                path: folder.to_string(),
            });
        }

        let mut tracked = Vec::new();
        for path in self.store.list_markdown(folder).await? {
            let doc = match self.read_doc(&path).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping unreadable note");
                    continue;
                }
            };
            if doc.meta.get(crate::frontmatter::KEY_BLOCK_ID).is_none() {
                continue;
            }
            match doc.blockid() {
                Some(blockid) => tracked.push(TrackedNote {
                    name: path.rsplit('/').next().unwrap_or(&path).to_string(),
                    path,
                    blockid,
                }),
                None => warn!(path = %path, "invalid blockid in frontmatter"),
            }
        }
        Ok(tracked)
    }

    async fn read_doc(&self, path: &str) -> Result<NoteDoc> {
        let text = self.store.read(path).await?;
        NoteDoc::parse(&text)
    }

    /// Stored id of a note; unreadable metadata counts as no id
    async fn stored_blockid(&self, path: &str) -> Option<u64> {
        match self.read_doc(path).await {
            Ok(doc) => doc.blockid(),
            Err(e) => {
                warn!(path = %path, error = %e, "could not read frontmatter");
                None
            }
        }
    }

    async fn create_note(&self, path: &str, body: &str, meta: &Mapping) -> Result<()> {
        let doc = NoteDoc::new(meta.clone(), body);
        self.store.write(path, &doc.render()?).await?;
        info!(path = %path, "note created");
        Ok(())
    }

    async fn update_note(&self, path: &str, body: &str, meta: &Mapping) -> Result<()> {
        let mut doc = self.read_doc(path).await?;
        doc.body = body.to_string();
        doc.merge(meta);
        self.store.write(path, &doc.render()?).await?;
        info!(path = %path, "note updated");
        Ok(())
    }

    /// Content to store: an embed of the downloaded file when downloads
    /// are on and the block has one, otherwise `content` as given. A failed
    /// download keeps the given content.
    async fn body_with_attachment(
        &self,
        folder: &str,
        name: &str,
        content: &str,
        attachment: Option<&Attachment>,
    ) -> String {
        let Some(attachment) = attachment else {
            return content.to_string();
        };

        match materialize(
            self.api.as_ref(),
            self.store.as_ref(),
            &self.settings,
            folder,
            attachment,
            Some(name),
        )
        .await
        {
            Ok(Some(path)) => embed(&path),
            Ok(None) => content.to_string(),
            Err(e) => {
                warn!(url = %attachment.url, error = %e, "attachment download failed");
                content.to_string()
            }
        }
    }
}
