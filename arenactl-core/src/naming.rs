//! File, folder and block-reference naming rules

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{ArenaError, Result};

static NUMERIC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+$").expect("valid regex"));

/// Replace path separators and `:` with spaces
pub fn safe_filename(name: &str) -> String {
    name.replace(['\\', '/', ':'], " ")
}

/// Folder name for a channel: title without a trailing `-<digits>`,
/// made safe for use as a single path component.
pub fn permalink(title: &str) -> String {
    safe_filename(&NUMERIC_SUFFIX.replace(title, ""))
}

/// Join vault-relative path components with `/`, skipping empty ones
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// `<folder>/<safe name>.md`
pub fn note_path(folder: &str, name: &str) -> String {
    join(&[folder, &format!("{}.md", safe_filename(name))])
}

/// File stem of a vault-relative path (`a/b/Idea.md` -> `Idea`)
pub fn stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.strip_suffix(".md").unwrap_or(file)
}

/// Accepts a bare numeric id or any URL whose path contains `/block/<id>`.
pub fn parse_block_ref(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let invalid = || ArenaError::InvalidBlockRef {
        input: input.to_string(),
    };

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse().map_err(|_| invalid());
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let mut segments = url.path_segments().ok_or_else(invalid)?;

    while let Some(segment) = segments.next() {
        if segment == "block" {
            let id = segments.next().ok_or_else(invalid)?;
            if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
                return id.parse().map_err(|_| invalid());
            }
            return Err(invalid());
        }
    }

    Err(invalid())
}
