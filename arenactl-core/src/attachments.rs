//! Downloading block files into the vault

use tracing::info;

use crate::api::ArenaApi;
use crate::config::{DownloadMode, Settings};
use crate::error::{ArenaError, Result};
use crate::model::Attachment;
use crate::naming::{join, safe_filename};
use crate::vault::FileStore;

/// `<title or file_name>.<extension>`, without doubling an extension the
/// name already carries, made safe for the file system.
pub fn attachment_file_name(attachment: &Attachment, title: Option<&str>) -> String {
    let mut name = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&attachment.file_name)
        .to_string();

    if attachment.extension.is_empty() {
        return safe_filename(&name);
    }

    let suffix = format!(".{}", attachment.extension);
    let cut = name.len().saturating_sub(suffix.len());
    if name
        .get(cut..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(&suffix))
    {
        name.truncate(cut);
    }
    safe_filename(&format!("{}{}", name, suffix))
}

/// Folder the attachment of a note in `note_folder` is written to, or
/// `None` when downloading is off.
pub fn attachment_folder(settings: &Settings, note_folder: &str) -> Result<Option<String>> {
    let sub = settings.attachments_folder.trim();
    match settings.download_attachments_type {
        DownloadMode::None => Ok(None),
        DownloadMode::Channel if sub.is_empty() => Ok(Some(note_folder.to_string())),
        DownloadMode::Channel => Ok(Some(join(&[note_folder, sub]))),
        DownloadMode::Custom if sub.is_empty() => Err(ArenaError::config(
            "attachments_folder must be set when download_attachments_type = custom",
        )),
        DownloadMode::Custom => Ok(Some(join(&[sub]))),
    }
}

/// Wiki-style embed of a vault file
pub fn embed(path: &str) -> String {
    format!("![[{}]]", path)
}

/// Fetch the file and write it into the vault.
///
/// Returns the vault path of the written file, or `None` when downloads
/// are disabled.
pub async fn materialize(
    api: &dyn ArenaApi,
    store: &dyn FileStore,
    settings: &Settings,
    note_folder: &str,
    attachment: &Attachment,
    title: Option<&str>,
) -> Result<Option<String>> {
    let Some(folder) = attachment_folder(settings, note_folder)? else {
        return Ok(None);
    };

    let bytes = api.download(&attachment.url).await?;
    store.create_folder(&folder).await?;

    let path = join(&[&folder, &attachment_file_name(attachment, title)]);
    store.write_binary(&path, &bytes).await?;
    info!(path = %path, bytes = bytes.len(), "attachment downloaded");

    Ok(Some(path))
}
