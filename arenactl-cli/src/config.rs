use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use arenactl_core::config::SETTING_KEYS;
use arenactl_core::{Settings, SettingsStore, TomlSettingsStore};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Print one setting
    Get(GetArgs),
    /// Change one setting
    Set(SetArgs),
    /// Print all settings (token masked)
    List,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Setting name (access_token, username, folder, ...)
    pub key: String,

    /// Print the access token unmasked
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Setting name (access_token, username, folder, ...)
    pub key: String,

    /// New value
    pub value: String,
}

pub fn store_for(path: Option<PathBuf>) -> TomlSettingsStore {
    TomlSettingsStore::new(path.unwrap_or_else(TomlSettingsStore::default_path))
}

pub fn run_config(args: ConfigArgs, store: &TomlSettingsStore) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args, store),
        ConfigCommands::Get(args) => run_get(args, store),
        ConfigCommands::Set(args) => run_set(args, store),
        ConfigCommands::List => run_list(store),
        ConfigCommands::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}

fn run_init(args: InitArgs, store: &TomlSettingsStore) -> Result<()> {
    if store.exists() && !args.force {
        return Err(anyhow!(
            "Config already exists at {}\n\nUse --force to overwrite",
            store.path().display()
        ));
    }

    store
        .save(&Settings::default())
        .with_context(|| format!("Failed to write config file: {}", store.path().display()))?;

    println!("✅ Created config at: {}", store.path().display());
    println!("\nNext steps:");
    println!("  1. arenactl config set access_token <token from dev.are.na>");
    println!("  2. arenactl config set username <your are.na slug>");
    println!("  3. arenactl channel");

    Ok(())
}

fn run_get(args: GetArgs, store: &TomlSettingsStore) -> Result<()> {
    let settings = store.load()?;
    println!("{}", settings.get(&args.key, args.reveal)?);
    Ok(())
}

fn run_set(args: SetArgs, store: &TomlSettingsStore) -> Result<()> {
    let mut settings = store.load()?;
    settings.set(&args.key, &args.value).with_context(|| {
        format!(
            "Could not set '{}' (valid keys: {})",
            args.key,
            SETTING_KEYS.join(", ")
        )
    })?;
    store.save(&settings)?;

    println!("✓ {} = {}", args.key, settings.get(&args.key, false)?);
    Ok(())
}

fn run_list(store: &TomlSettingsStore) -> Result<()> {
    let settings = store.load()?;
    let toml_str = toml::to_string_pretty(&settings.redacted())
        .context("Failed to serialize config to TOML")?;

    println!("{}", toml_str);
    Ok(())
}
