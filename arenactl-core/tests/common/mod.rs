#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arenactl_core::model::{Attachment, Block, BlockClass, BlockUser, Channel};
use arenactl_core::{
    ArenaApi, ArenaError, ArenaSync, BlockDraft, FileStore, FsVault, Launcher, Notifier, Picker,
    Result, Settings,
};
use async_trait::async_trait;
use tempfile::TempDir;

/// Scripted Are.na account kept in memory
#[derive(Default)]
pub struct MockArena {
    pub channels: Mutex<Vec<Channel>>,
    pub contents: Mutex<HashMap<String, Vec<Block>>>,
    pub blocks: Mutex<HashMap<u64, Block>>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub created: Mutex<Vec<(String, BlockDraft)>>,
    pub updated: Mutex<Vec<(u64, BlockDraft)>>,
    next_id: Mutex<u64>,
}

impl MockArena {
    pub fn new() -> Self {
        let mock = Self::default();
        *mock.next_id.lock().unwrap() = 1000;
        mock
    }

    pub fn add_channel(&self, slug: &str, title: &str, blocks: Vec<Block>) {
        let mut channels = self.channels.lock().unwrap();
        let id = channels.len() as u64 + 1;
        channels.push(Channel {
            id,
            slug: slug.into(),
            title: title.into(),
            length: blocks.len() as u64,
            status: "public".into(),
            class: "Channel".into(),
        });
        for block in &blocks {
            self.add_block(block.clone());
        }
        self.contents.lock().unwrap().insert(slug.into(), blocks);
    }

    pub fn add_block(&self, block: Block) {
        self.blocks.lock().unwrap().insert(block.id, block);
    }

    pub fn add_file(&self, url: &str, bytes: &[u8]) {
        self.files.lock().unwrap().insert(url.into(), bytes.to_vec());
    }

    pub fn created(&self) -> Vec<(String, BlockDraft)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(u64, BlockDraft)> {
        self.updated.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArenaApi for MockArena {
    async fn list_channels_for_user(&self, _username: &str) -> Result<Vec<Channel>> {
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn list_blocks_in_channel(&self, slug: &str) -> Result<Vec<Block>> {
        self.contents
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound {
                resource: format!("channel {}", slug),
            })
    }

    async fn get_block(&self, id: u64) -> Result<Block> {
        self.blocks
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound {
                resource: format!("block {}", id),
            })
    }

    async fn create_block(&self, channel_slug: &str, draft: &BlockDraft) -> Result<Option<Block>> {
        if draft.is_empty() {
            return Ok(None);
        }
        self.created
            .lock()
            .unwrap()
            .push((channel_slug.to_string(), draft.clone()));

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let block = text_block(*next, &draft.title, &draft.content);
        self.add_block(block.clone());
        Ok(Some(block))
    }

    async fn update_block(&self, id: u64, draft: &BlockDraft) -> Result<()> {
        self.updated.lock().unwrap().push((id, draft.clone()));
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ArenaError::Http {
                status: 404,
                body: url.to_string(),
            })
    }
}

/// Picker that answers with fixed indices, or cancels when unset
#[derive(Default)]
pub struct ScriptedPicker {
    pub channel: Option<usize>,
    pub block: Option<usize>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedPicker {
    pub fn choosing(channel: usize) -> Self {
        Self {
            channel: Some(channel),
            ..Default::default()
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick_channel(&self, prompt: &str, channels: &[Channel]) -> Result<Channel> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.channel
            .and_then(|i| channels.get(i).cloned())
            .ok_or(ArenaError::Cancelled)
    }

    fn pick_block(&self, _channel: &Channel, blocks: &[Block]) -> Result<Block> {
        self.block
            .and_then(|i| blocks.get(i).cloned())
            .ok_or(ArenaError::Cancelled)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub opened: Mutex<Vec<String>>,
}

impl Launcher for RecordingLauncher {
    fn open_url(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn settings() -> Settings {
    Settings {
        access_token: "token".into(),
        username: "ana".into(),
        ..Settings::default()
    }
}

pub fn text_block(id: u64, title: &str, content: &str) -> Block {
    Block {
        id,
        class: BlockClass::Text,
        title: Some(title.into()),
        generated_title: Some(title.into()),
        content: content.into(),
        user: Some(BlockUser {
            slug: "ana".into(),
            username: "Ana".into(),
        }),
        ..Block::default()
    }
}

pub fn attachment_block(id: u64, title: &str, url: &str) -> Block {
    Block {
        id,
        class: BlockClass::Attachment,
        title: Some(title.into()),
        generated_title: Some(title.into()),
        attachment: Some(Attachment {
            url: url.into(),
            file_name: "paper.pdf".into(),
            extension: "pdf".into(),
        }),
        ..Block::default()
    }
}

/// A temp-dir vault wired to a mock account
pub struct Fixture {
    pub dir: TempDir,
    pub vault: Arc<FsVault>,
    pub arena: Arc<MockArena>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let vault = Arc::new(FsVault::new(dir.path()));
        Self {
            dir,
            vault,
            arena: Arc::new(MockArena::new()),
        }
    }

    pub fn sync(&self, settings: Settings) -> ArenaSync {
        ArenaSync::new(settings, self.arena.clone(), self.vault.clone())
    }

    pub async fn write(&self, path: &str, content: &str) {
        if let Some((folder, _)) = path.rsplit_once('/') {
            self.vault.create_folder(folder).await.unwrap();
        }
        self.vault.write(path, content).await.unwrap();
    }

    pub async fn read(&self, path: &str) -> String {
        self.vault.read(path).await.unwrap()
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.vault.exists(path).await
    }
}
