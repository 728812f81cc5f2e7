//! HTTP implementation of [`ArenaApi`] for the Are.na v2 REST API.
//!
//! Every request carries the bearer token and a `v=<unix millis>` query
//! parameter so intermediate caches never serve a stale block.

use arenactl_core::{
    ArenaApi, ArenaError, Block, BlockDraft, Channel, Result, Settings, CONTENTS_PAGE_CAP,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChannelPage {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChannelContents {
    #[serde(default)]
    contents: Vec<Block>,
}

/// Error payload; Are.na sometimes answers 200 with `code: 422` in the body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    fn text(self) -> Option<String> {
        self.message
            .or(self.description)
            .filter(|m| !m.trim().is_empty())
    }
}

pub struct ArenaClient {
    http: Client,
    api_base: String,
    token: String,
}

impl ArenaClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("arenactl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArenaError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.api_base, &settings.access_token)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .query(&[("v", cache_buster())])
    }

    async fn send(&self, builder: RequestBuilder, resource: &str) -> Result<String> {
        let response = builder
            .send()
            .await
            .map_err(|e| ArenaError::transport(e.to_string()))?;
        handle_response(response, resource).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(path, "GET");
        let request = self.authed(self.http.get(self.endpoint(path))).query(query);
        let body = self.send(request, path).await?;
        serde_json::from_str(&body).map_err(|e| ArenaError::json(path, e))
    }
}

/// Unix time in milliseconds
fn cache_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Map a response to its body, or to the matching [`ArenaError`]
async fn handle_response(response: Response, resource: &str) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ArenaError::transport(e.to_string()))?;

    let error_body = ErrorBody::parse(&body);
    if status == StatusCode::UNPROCESSABLE_ENTITY
        || error_body.as_ref().and_then(|e| e.code) == Some(422)
    {
        let message = error_body
            .and_then(ErrorBody::text)
            .unwrap_or_else(|| "Are.na rejected the request".to_string());
        return Err(ArenaError::Validation { message });
    }

    if status.is_success() {
        return Ok(body);
    }

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArenaError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => ArenaError::NotFound {
            resource: resource.to_string(),
        },
        _ => ArenaError::Http {
            status: status.as_u16(),
            body,
        },
    })
}

#[async_trait]
impl ArenaApi for ArenaClient {
    async fn list_channels_for_user(&self, username: &str) -> Result<Vec<Channel>> {
        let path = format!("/users/{}/channels", urlencoding::encode(username));
        let first: ChannelPage = self.get_json(&path, &[("page", "1".to_string())]).await?;

        let total = first.total_pages.unwrap_or(1).max(1);
        let mut channels = first.channels;
        for page in 2..=total {
            match self
                .get_json::<ChannelPage>(&path, &[("page", page.to_string())])
                .await
            {
                Ok(next) => channels.extend(next.channels),
                Err(e) => {
                    warn!(page, total, error = %e, "stopping channel pagination early");
                    break;
                }
            }
        }

        debug!(username, count = channels.len(), "channels listed");
        Ok(channels)
    }

    async fn list_blocks_in_channel(&self, slug: &str) -> Result<Vec<Block>> {
        let path = format!("/channels/{}/contents", urlencoding::encode(slug));
        let page: ChannelContents = self
            .get_json(&path, &[("per", CONTENTS_PAGE_CAP.to_string())])
            .await?;
        Ok(page.contents)
    }

    async fn get_block(&self, id: u64) -> Result<Block> {
        self.get_json(&format!("/blocks/{}", id), &[]).await
    }

    async fn create_block(&self, channel_slug: &str, draft: &BlockDraft) -> Result<Option<Block>> {
        if draft.is_empty() {
            debug!(channel_slug, "empty draft, nothing sent");
            return Ok(None);
        }

        let path = format!("/channels/{}/blocks", urlencoding::encode(channel_slug));
        let request = self
            .authed(self.http.post(self.endpoint(&path)))
            .json(draft);
        let body = self.send(request, &path).await?;
        let block = serde_json::from_str(&body).map_err(|e| ArenaError::json(&path, e))?;
        Ok(Some(block))
    }

    async fn update_block(&self, id: u64, draft: &BlockDraft) -> Result<()> {
        let path = format!("/blocks/{}", id);
        let request = self.authed(self.http.put(self.endpoint(&path))).json(draft);
        self.send(request, &path).await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ArenaError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArenaError::Http {
                status: status.as_u16(),
                body: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArenaError::transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
