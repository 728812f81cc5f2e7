//! Wiring between the CLI and the sync actions in `arenactl-core`

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arenactl_client::ArenaClient;
use arenactl_core::{ArenaSync, FsVault, Host, SettingsStore, TomlSettingsStore};
use tracing::debug;

use crate::prompt::{BrowserLauncher, TerminalPicker};
use crate::ui::{self, ConsoleNotifier};

/// Loaded settings, the vault on disk and the remote client
pub struct Session {
    sync: ArenaSync,
    vault: Arc<FsVault>,
}

impl Session {
    pub fn open(store: &TomlSettingsStore, vault_flag: Option<&Path>) -> Result<Self> {
        let mut settings = store
            .load()
            .with_context(|| format!("Failed to load {}", store.path().display()))?;
        settings.apply_env();

        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let root = vault_flag
            .map(Path::to_path_buf)
            .or_else(|| settings.vault.clone())
            .map(|root| cwd.join(root))
            .unwrap_or(cwd);
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        debug!(vault = %root.display(), folder = %settings.folder, "session opened");

        let client = ArenaClient::from_settings(&settings)?;
        let vault = Arc::new(FsVault::new(root));
        let sync = ArenaSync::new(settings, Arc::new(client), vault.clone());
        Ok(Self { sync, vault })
    }

    /// Vault path of a note given relative to the working directory
    fn note(&self, note: &Path) -> Result<String> {
        let absolute = if note.is_absolute() {
            note.to_path_buf()
        } else {
            std::env::current_dir()?.join(note)
        };
        let absolute = std::fs::canonicalize(&absolute).unwrap_or(absolute);
        self.vault.relativize(&absolute).ok_or_else(|| {
            anyhow!(
                "{} is not inside the vault {} (set --vault or ARENACTL_VAULT)",
                note.display(),
                self.vault.root().display()
            )
        })
    }
}

pub async fn run_push(session: &Session, note: &Path) -> Result<()> {
    let note = session.note(note)?;
    let notifier = ConsoleNotifier::new();
    let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);

    session.sync.push(host, &note).await.map_err(ui::report)?;
    Ok(())
}

pub async fn run_pull(session: &Session, note: &Path) -> Result<()> {
    let note = session.note(note)?;
    let sync = &session.sync;

    ui::with_spinner_async("Pulling block from Are.na", |notifier| async move {
        let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);
        sync.pull(host, &note).await
    })
    .await
    .map_err(ui::report)?;
    Ok(())
}

pub async fn run_channel(session: &Session, slug: Option<String>) -> Result<()> {
    let sync = &session.sync;
    let report = match slug {
        Some(slug) => {
            ui::with_spinner_async(format!("Pulling {}", slug), |notifier| async move {
                let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);
                sync.pull_channel(host, Some(&slug)).await
            })
            .await
        }
        None => {
            let notifier = ConsoleNotifier::new();
            let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);
            sync.pull_channel(host, None).await
        }
    }
    .map_err(ui::report)?;

    if report.skipped > 0 || report.failed > 0 {
        println!(
            "{} skipped (channels and media), {} failed",
            report.skipped, report.failed
        );
    }
    Ok(())
}

pub async fn run_open(session: &Session, note: &Path) -> Result<()> {
    let note = session.note(note)?;
    let notifier = ConsoleNotifier::new();
    let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);

    let url = session
        .sync
        .open_remote(host, &note)
        .await
        .map_err(ui::report)?;
    println!("{}", url);
    Ok(())
}

pub async fn run_fetch(session: &Session, input: &str) -> Result<()> {
    let sync = &session.sync;
    ui::with_spinner_async("Fetching block", |notifier| async move {
        let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);
        sync.fetch_block(host, input).await
    })
    .await
    .map_err(ui::report)?;
    Ok(())
}

pub async fn run_pick(session: &Session) -> Result<()> {
    let notifier = ConsoleNotifier::new();
    let host = Host::new(&TerminalPicker, &notifier, &BrowserLauncher);

    session.sync.pick_block(host).await.map_err(ui::report)?;
    Ok(())
}

pub async fn run_tracked(session: &Session, folder: Option<&str>) -> Result<()> {
    let tracked = session.sync.tracked(folder).await.map_err(ui::report)?;

    if tracked.is_empty() {
        println!("No notes linked to Are.na blocks");
        return Ok(());
    }
    for note in tracked {
        println!("{}\t{}", note.blockid, note.path);
    }
    Ok(())
}
