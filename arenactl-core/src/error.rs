/// Structured error types for arenactl-core and arenactl-client.
///
/// Uses `thiserror` so the orchestrator can branch on what went wrong.
/// The binary crate (arenactl-cli) wraps these in `anyhow` for reporting.

use std::io;
use thiserror::Error;

/// Main error type for arenactl operations
#[derive(Error, Debug)]
pub enum ArenaError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Frontmatter YAML could not be parsed or written
    #[error("YAML error in {context}: {source}")]
    Yaml {
        context: String,
        source: serde_yaml::Error,
    },

    /// JSON decoding of a remote response failed
    #[error("JSON error at {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// A required setting is empty
    #[error("Missing setting '{key}'. Run: arenactl config set {key} <value>")]
    MissingSetting { key: &'static str },

    /// Configuration file is unreadable or inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// The note the command was pointed at does not exist
    #[error("Note not found: {path}")]
    NoteNotFound { path: String },

    /// Folder listing requested for a path that is not a folder
    #[error("Folder not found: {path}")]
    FolderNotFound { path: String },

    /// The note has no `blockid` in its frontmatter
    #[error("No block id found in frontmatter of {path}")]
    MissingBlockId { path: String },

    /// The note belongs to a different Are.na user
    #[error("You don't have permission to update {owner}'s block")]
    PermissionDenied { owner: String },

    /// Input is neither a numeric block id nor a block URL
    #[error("Not a block id or block URL: '{input}'")]
    InvalidBlockRef { input: String },

    /// Every candidate file name up to the cap is taken by another block
    #[error("No free file name for '{base}' in {folder} after {attempts} attempts")]
    NameProbeExhausted {
        folder: String,
        base: String,
        attempts: usize,
    },

    /// The user dismissed a prompt
    #[error("Cancelled")]
    Cancelled,

    /// Remote rejected the request as invalid (HTTP 422)
    #[error("Are.na rejected the request: {message}")]
    Validation { message: String },

    /// Token missing, expired or lacking access (HTTP 401/403)
    #[error("Are.na refused the access token (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Remote resource does not exist (HTTP 404)
    #[error("Not found on Are.na: {resource}")]
    NotFound { resource: String },

    /// Any other non-success HTTP status
    #[error("Are.na returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or body transfer failure
    #[error("Request to Are.na failed: {reason}")]
    Transport { reason: String },
}

/// Result type alias for arenactl operations
pub type Result<T> = std::result::Result<T, ArenaError>;

impl ArenaError {
    /// Create a YAML error with context
    pub fn yaml(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            context: context.into(),
            source,
        }
    }

    /// Create a JSON error with context
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn note_not_found(path: impl Into<String>) -> Self {
        Self::NoteNotFound { path: path.into() }
    }

    pub fn missing_block_id(path: impl Into<String>) -> Self {
        Self::MissingBlockId { path: path.into() }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Errors the user can act on from the message alone.
    ///
    /// Everything else is unexpected and gets logged with full detail
    /// before a generic notice is shown.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::MissingSetting { .. }
                | Self::NoteNotFound { .. }
                | Self::FolderNotFound { .. }
                | Self::MissingBlockId { .. }
                | Self::PermissionDenied { .. }
                | Self::InvalidBlockRef { .. }
                | Self::Cancelled
                | Self::Validation { .. }
                | Self::Unauthorized { .. }
                | Self::NotFound { .. }
                | Self::Config { .. }
        )
    }
}
