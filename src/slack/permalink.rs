//! Permalink resolution.
//!
//! External call to the chat platform's permalink API with a short timeout;
//! any failure degrades to a deterministic URL built from channel and
//! timestamp. Resolution failure is never surfaced as an error.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::ChannelId;

const PERMALINK_URL: &str = "https://slack.com/api/chat.getPermalink";
const PERMALINK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PermalinkError {
    #[error("permalink request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("permalink api refused: {reason}")]
    Api { reason: String },

    #[error("permalink lookup disabled")]
    Disabled,
}

/// Seam for permalink lookups so tests can stub the network.
pub trait PermalinkSource: Send + Sync {
    fn permalink(&self, channel: &ChannelId, ts: &str) -> Result<String, PermalinkError>;
}

/// Deterministic local fallback, used whenever the external lookup fails.
pub fn fallback_permalink(channel: &ChannelId, ts: &str) -> String {
    format!(
        "https://slack.com/archives/{}/p{}",
        channel.as_str(),
        ts.replace('.', "")
    )
}

/// Bearer-authenticated client for `chat.getPermalink`.
pub struct SlackApiPermalinks {
    client: reqwest::blocking::Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    ok: bool,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SlackApiPermalinks {
    pub fn new(token: impl Into<String>) -> Result<Self, PermalinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(PERMALINK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl PermalinkSource for SlackApiPermalinks {
    fn permalink(&self, channel: &ChannelId, ts: &str) -> Result<String, PermalinkError> {
        let response: PermalinkResponse = self
            .client
            .get(PERMALINK_URL)
            .bearer_auth(&self.token)
            .query(&[("channel", channel.as_str()), ("message_ts", ts)])
            .send()?
            .error_for_status()?
            .json()?;

        if !response.ok {
            return Err(PermalinkError::Api {
                reason: response.error.unwrap_or_else(|| "unknown".into()),
            });
        }
        response.permalink.ok_or(PermalinkError::Api {
            reason: "missing permalink field".into(),
        })
    }
}

/// Always-failing source; forces the deterministic fallback. Useful when no
/// bot token is configured.
pub struct NoPermalinks;

impl PermalinkSource for NoPermalinks {
    fn permalink(&self, _channel: &ChannelId, _ts: &str) -> Result<String, PermalinkError> {
        Err(PermalinkError::Disabled)
    }
}
