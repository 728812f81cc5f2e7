use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArenaError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.are.na/v2";
pub const DEFAULT_FOLDER: &str = "arena";

/// Where downloaded attachments land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Attachments are linked, never downloaded
    #[default]
    None,
    /// Next to the channel's notes, optionally inside `attachments_folder`
    Channel,
    /// In `attachments_folder`, relative to the vault root
    Custom,
}

impl DownloadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Channel => "channel",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "channel" => Some(Self::Channel),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Persisted arenactl settings (~/.arenactl/config.toml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    pub username: String,
    /// Root directory of the notes; empty means the current directory
    pub vault: Option<PathBuf>,
    /// Folder inside the vault holding one subfolder per channel
    pub folder: String,
    pub download_attachments_type: DownloadMode,
    pub attachments_folder: String,
    pub api_base: String,
    pub web_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            username: String::new(),
            vault: None,
            folder: DEFAULT_FOLDER.to_string(),
            download_attachments_type: DownloadMode::None,
            attachments_folder: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            web_base: crate::model::ARENA_WEB_URL.to_string(),
        }
    }
}

/// Keys accepted by `config get` / `config set`
pub const SETTING_KEYS: &[&str] = &[
    "access_token",
    "username",
    "vault",
    "folder",
    "download_attachments_type",
    "attachments_folder",
    "api_base",
    "web_base",
];

impl Settings {
    /// Token, username and root folder must all be set before any command
    /// talks to Are.na or writes notes.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(ArenaError::MissingSetting { key: "access_token" });
        }
        if self.username.trim().is_empty() {
            return Err(ArenaError::MissingSetting { key: "username" });
        }
        if self.folder.trim().is_empty() {
            return Err(ArenaError::MissingSetting { key: "folder" });
        }
        if self.download_attachments_type == DownloadMode::Custom
            && self.attachments_folder.trim().is_empty()
        {
            return Err(ArenaError::config(
                "attachments_folder must be set when download_attachments_type = custom",
            ));
        }
        Ok(())
    }

    pub fn downloads_enabled(&self) -> bool {
        self.download_attachments_type != DownloadMode::None
    }

    /// Apply ARENA_ACCESS_TOKEN / ARENA_USERNAME / ARENACTL_VAULT overrides
    pub fn apply_env(&mut self) {
        if let Ok(token) = env::var("ARENA_ACCESS_TOKEN") {
            if !token.is_empty() {
                debug!("access token taken from ARENA_ACCESS_TOKEN");
                self.access_token = token;
            }
        }
        if let Ok(username) = env::var("ARENA_USERNAME") {
            if !username.is_empty() {
                self.username = username;
            }
        }
        if let Ok(vault) = env::var("ARENACTL_VAULT") {
            if !vault.is_empty() {
                self.vault = Some(PathBuf::from(vault));
            }
        }
    }

    /// Value of a setting by key; the token is masked unless `reveal`
    pub fn get(&self, key: &str, reveal: bool) -> Result<String> {
        let value = match key {
            "access_token" if reveal => self.access_token.clone(),
            "access_token" => mask(&self.access_token),
            "username" => self.username.clone(),
            "vault" => self
                .vault
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "folder" => self.folder.clone(),
            "download_attachments_type" => self.download_attachments_type.as_str().to_string(),
            "attachments_folder" => self.attachments_folder.clone(),
            "api_base" => self.api_base.clone(),
            "web_base" => self.web_base.clone(),
            _ => return Err(ArenaError::config(format!("Unknown config key: {}", key))),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "access_token" => self.access_token = value.trim().to_string(),
            "username" => self.username = value.trim().to_string(),
            "vault" => {
                self.vault = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value.trim()))
                }
            }
            "folder" => self.folder = value.trim().trim_matches('/').to_string(),
            "download_attachments_type" => {
                self.download_attachments_type = DownloadMode::parse(value).ok_or_else(|| {
                    ArenaError::config(format!(
                        "download_attachments_type must be none, channel or custom (got '{}')",
                        value
                    ))
                })?
            }
            "attachments_folder" => {
                self.attachments_folder = value.trim().trim_matches('/').to_string()
            }
            "api_base" => self.api_base = value.trim().trim_end_matches('/').to_string(),
            "web_base" => self.web_base = value.trim().trim_end_matches('/').to_string(),
            _ => return Err(ArenaError::config(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    /// Copy safe to print: the token is masked
    pub fn redacted(&self) -> Self {
        Self {
            access_token: mask(&self.access_token),
            ..self.clone()
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

/// Persistence for [`Settings`]
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept in a TOML file
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// ~/.arenactl/config.toml, or ARENACTL_CONFIG when set
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("ARENACTL_CONFIG") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        config_dir().join("config.toml")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// ~/.arenactl
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".arenactl")
}

impl SettingsStore for TomlSettingsStore {
    /// A missing file yields defaults; a malformed one is an error
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("no config at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            ArenaError::config(format!(
                "Failed to parse {} (invalid TOML): {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(settings)
            .map_err(|e| ArenaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ready() -> Settings {
        Settings {
            access_token: "tok".into(),
            username: "ana".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.folder, "arena");
        assert_eq!(settings.download_attachments_type, DownloadMode::None);
        assert!(!settings.downloads_enabled());
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_ensure_ready_reports_first_missing_key() {
        let err = Settings::default().ensure_ready().unwrap_err();
        assert!(matches!(err, ArenaError::MissingSetting { key: "access_token" }));

        let mut settings = ready();
        settings.folder = String::new();
        let err = settings.ensure_ready().unwrap_err();
        assert!(matches!(err, ArenaError::MissingSetting { key: "folder" }));

        assert!(ready().ensure_ready().is_ok());
    }

    #[test]
    fn test_custom_mode_needs_folder() {
        let mut settings = ready();
        settings.download_attachments_type = DownloadMode::Custom;
        assert!(settings.ensure_ready().is_err());
        settings.attachments_folder = "files".into();
        assert!(settings.ensure_ready().is_ok());
    }

    #[test]
    fn test_set_and_get() {
        let mut settings = Settings::default();
        settings.set("download_attachments_type", "Channel").unwrap();
        settings.set("folder", "/notes/arena/").unwrap();
        settings.set("access_token", "abcdefgh").unwrap();

        assert_eq!(settings.get("download_attachments_type", false).unwrap(), "channel");
        assert_eq!(settings.get("folder", false).unwrap(), "notes/arena");
        assert_eq!(settings.get("access_token", false).unwrap(), "****efgh");
        assert_eq!(settings.get("access_token", true).unwrap(), "abcdefgh");

        assert!(settings.set("download_attachments_type", "always").is_err());
        assert!(settings.set("nope", "x").is_err());
        assert!(settings.get("nope", false).is_err());
    }

    #[test]
    fn test_toml_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("nested/config.toml"));

        assert_eq!(store.load().unwrap(), Settings::default());

        let mut settings = ready();
        settings.download_attachments_type = DownloadMode::Custom;
        settings.attachments_folder = "files".into();
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_toml_accepts_camel_case_token() {
        let settings: Settings =
            toml::from_str("accessToken = \"t\"\nusername = \"u\"\n").unwrap();
        assert_eq!(settings.access_token, "t");
        assert_eq!(settings.folder, "arena");
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "username = [").unwrap();
        let err = TomlSettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ArenaError::Config { .. }));
    }
}
