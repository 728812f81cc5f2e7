//! Are.na entities as returned by the v2 API.
//!
//! Only the fields arenactl reads are modelled; everything else in the
//! response is ignored by serde.

use serde::{Deserialize, Serialize};

/// Public web address of a block page
pub const ARENA_WEB_URL: &str = "https://www.are.na";

/// A remote collection of blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub slug: String,
    pub title: String,
    /// Number of items connected to the channel
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub class: String,
}

impl Channel {
    pub fn is_private(&self) -> bool {
        self.status == "private"
    }
}

/// Kind of a block (`class` in the API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlockClass {
    #[default]
    Text,
    Image,
    Link,
    Attachment,
    Media,
    Channel,
    #[serde(other)]
    Other,
}

impl BlockClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Link => "Link",
            Self::Attachment => "Attachment",
            Self::Media => "Media",
            Self::Channel => "Channel",
            Self::Other => "Other",
        }
    }

    /// Sub-channels and embedded media are not turned into notes
    pub fn is_note(&self) -> bool {
        !matches!(self, Self::Channel | Self::Media)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BlockUser {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Source {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ImageVersion {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Image {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub display: Option<ImageVersion>,
    #[serde(default)]
    pub original: Option<ImageVersion>,
    #[serde(default)]
    pub thumb: Option<ImageVersion>,
}

/// Downloadable file attached to a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub extension: String,
}

/// A remote content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    pub id: u64,
    #[serde(default)]
    pub class: BlockClass,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub generated_title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user: Option<BlockUser>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub position: Option<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Block {
    /// Display name used for the note file: generated title, then title,
    /// then the bare id.
    pub fn display_title(&self) -> String {
        [&self.generated_title, &self.title]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn display_image_url(&self) -> Option<&str> {
        self.image
            .as_ref()
            .and_then(|img| img.display.as_ref())
            .map(|v| v.url.as_str())
    }

    pub fn user_slug(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.slug.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Markdown body for the note when no attachment gets downloaded.
    pub fn note_body(&self) -> String {
        match self.class {
            BlockClass::Image | BlockClass::Link => match self.display_image_url() {
                Some(url) => format!("![]({})", url),
                None => self.content.clone(),
            },
            BlockClass::Attachment if self.content.is_empty() => match &self.attachment {
                Some(att) => format!("[{}]({})", att.file_name, att.url),
                None => String::new(),
            },
            _ => self.content.clone(),
        }
    }

    /// File that can be materialized next to the note, if any.
    pub fn attachment_source(&self) -> Option<Attachment> {
        match self.class {
            BlockClass::Attachment => self.attachment.clone(),
            BlockClass::Image => {
                let image = self.image.as_ref()?;
                let url = image
                    .original
                    .as_ref()
                    .or(image.display.as_ref())?
                    .url
                    .clone();
                let file_name = image
                    .filename
                    .clone()
                    .unwrap_or_else(|| self.display_title());
                let extension = extension_of(&file_name)
                    .or_else(|| {
                        image
                            .content_type
                            .as_deref()
                            .and_then(|ct| ct.strip_prefix("image/"))
                            .map(|ext| ext.replace("jpeg", "jpg"))
                    })
                    .unwrap_or_else(|| "png".to_string());
                Some(Attachment {
                    url,
                    file_name,
                    extension,
                })
            }
            BlockClass::Link => {
                let url = self.display_image_url()?.to_string();
                let path = url.split(['?', '#']).next().unwrap_or_default();
                let last = path.rsplit('/').next().unwrap_or_default();
                let extension = extension_of(last).unwrap_or_else(|| "png".to_string());
                Some(Attachment {
                    url,
                    file_name: self.display_title(),
                    extension,
                })
            }
            _ => None,
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > 5
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Order blocks the way the channel shows them (highest position first)
pub fn sort_by_position_desc(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| b.position.unwrap_or(0).cmp(&a.position.unwrap_or(0)));
}
