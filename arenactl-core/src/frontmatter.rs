//! YAML frontmatter parsing, merging and writing for notes
//!
//! Handles markdown files with YAML frontmatter:
//! ```markdown
//! ---
//! blockid: 42
//! channel: research
//! ---
//! Content here
//! ```
//!
//! Keys keep their order; unknown keys written by other tools survive every
//! rewrite.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::{ArenaError, Result};
use crate::model::Block;

const FRONTMATTER_DELIMITER: &str = "---";

pub const KEY_BLOCK_ID: &str = "blockid";
pub const KEY_CHANNEL: &str = "channel";
pub const KEY_CLASS: &str = "class";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_USER: &str = "user";
pub const KEY_TITLE: &str = "title";
pub const KEY_SOURCE_TITLE: &str = "source title";
pub const KEY_SOURCE_URL: &str = "source url";

static FRONTMATTER_REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)---.*?---\n").expect("valid regex"));

/// Remove every `---...---` region (and its trailing newline) from text
/// before it is sent to Are.na.
pub fn strip_frontmatter_regions(content: &str) -> String {
    FRONTMATTER_REGION.replace_all(content, "").into_owned()
}

/// A note split into its metadata block and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDoc {
    pub meta: Mapping,
    pub body: String,
}

impl NoteDoc {
    pub fn new(meta: Mapping, body: impl Into<String>) -> Self {
        Self {
            meta,
            body: body.into(),
        }
    }

    /// Parse a note. A file that does not open with a `---` line, or whose
    /// block is never closed, has no frontmatter and is all body.
    pub fn parse(content: &str) -> Result<Self> {
        let Some(after_open) = strip_delimiter_line(content) else {
            return Ok(Self::new(Mapping::new(), content));
        };

        let mut offset = 0;
        for line in after_open.split_inclusive('\n') {
            if line.trim_end_matches(['\r', '\n']) == FRONTMATTER_DELIMITER {
                let yaml = &after_open[..offset];
                let body = &after_open[offset + line.len()..];
                let meta = parse_mapping(yaml)?;
                return Ok(Self::new(meta, body));
            }
            offset += line.len();
        }

        Ok(Self::new(Mapping::new(), content))
    }

    /// Render back to file text. An empty metadata block is omitted.
    pub fn render(&self) -> Result<String> {
        if self.meta.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.meta)
            .map_err(|e| ArenaError::yaml("frontmatter", e))?;
        Ok(format!(
            "{delim}\n{yaml}{delim}\n{body}",
            delim = FRONTMATTER_DELIMITER,
            yaml = yaml,
            body = self.body
        ))
    }

    /// Overlay `incoming` onto the stored metadata: same keys are replaced
    /// in place, new keys are appended, all other keys are kept.
    pub fn merge(&mut self, incoming: &Mapping) {
        merge_into(&mut self.meta, incoming);
    }

    pub fn blockid(&self) -> Option<u64> {
        blockid_of(&self.meta)
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        string_of(&self.meta, key)
    }
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(FRONTMATTER_DELIMITER)?;
    rest.strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
}

fn parse_mapping(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml).map_err(|e| ArenaError::yaml("frontmatter", e))? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(ArenaError::config(format!(
            "frontmatter is not a key/value block: {:?}",
            other
        ))),
    }
}

pub fn merge_into(target: &mut Mapping, incoming: &Mapping) {
    for (key, value) in incoming {
        target.insert(key.clone(), value.clone());
    }
}

/// Numeric `blockid`, accepting both `42` and `"42"`
pub fn blockid_of(meta: &Mapping) -> Option<u64> {
    match meta.get(KEY_BLOCK_ID)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String view of a scalar value
pub fn string_of(meta: &Mapping, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Metadata written for a note generated from `block`
pub fn metadata_from_block(block: &Block, channel: Option<&str>) -> Mapping {
    let mut meta = Mapping::new();
    meta.insert(KEY_BLOCK_ID.into(), block.id.into());
    meta.insert(KEY_CLASS.into(), block.class.as_str().into());

    if let Some(description) = block.description.as_deref().filter(|d| !d.is_empty()) {
        meta.insert(KEY_DESCRIPTION.into(), description.into());
    }
    if let Some(user) = block.user_slug() {
        meta.insert(KEY_USER.into(), user.into());
    }
    if let Some(source) = &block.source {
        if let Some(title) = source.title.as_deref().filter(|t| !t.is_empty()) {
            meta.insert(KEY_SOURCE_TITLE.into(), title.into());
        }
        if let Some(url) = source.url.as_deref().filter(|u| !u.is_empty()) {
            meta.insert(KEY_SOURCE_URL.into(), url.into());
        }
    }
    if let Some(channel) = channel.filter(|c| !c.is_empty()) {
        meta.insert(KEY_CHANNEL.into(), channel.into());
    }

    meta
}
