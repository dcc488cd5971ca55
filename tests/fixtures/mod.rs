//! Shared wiring for the black-box pipeline tests.
#![allow(dead_code)]

use std::sync::Arc;

use dendrite::config::RegistryConfig;
use dendrite::core::ChannelId;
use dendrite::service::ChangeService;
use dendrite::slack::events::InboundEnvelope;
use dendrite::slack::{PermalinkError, PermalinkSource};
use dendrite::store::GraphStore;

pub const CHANNEL: &str = "C042";
pub const OTHER_CHANNEL: &str = "C999";

/// api is owned by UAPI1+UAPI2, web by UWEB, infra by UINFRA.
pub fn registry() -> RegistryConfig {
    serde_json::from_value(serde_json::json!({
        "slack": { "channel_name": "graph-changes", "channel_id": CHANNEL },
        "projects": [
            { "project_id": "api", "name": "API service", "owner_user_ids": ["UAPI1", "UAPI2"] },
            { "project_id": "web", "name": "Web frontend", "owner_user_ids": ["UWEB"] },
            { "project_id": "infra", "name": "Infrastructure", "owner_user_ids": ["UINFRA"] },
        ],
    }))
    .expect("fixture registry")
}

/// Always resolves to a stable fake permalink.
pub struct StubPermalinks;

impl PermalinkSource for StubPermalinks {
    fn permalink(&self, channel: &ChannelId, ts: &str) -> Result<String, PermalinkError> {
        Ok(format!("https://permalinks.test/{}/{ts}", channel.as_str()))
    }
}

/// Always fails, forcing the deterministic fallback.
pub struct BrokenPermalinks;

impl PermalinkSource for BrokenPermalinks {
    fn permalink(&self, _channel: &ChannelId, _ts: &str) -> Result<String, PermalinkError> {
        Err(PermalinkError::Api {
            reason: "stubbed outage".into(),
        })
    }
}

/// Bootstrapped service over a fresh store.
pub fn service() -> (Arc<GraphStore>, Arc<ChangeService>) {
    service_with(Arc::new(StubPermalinks))
}

pub fn service_with(
    permalinks: Arc<dyn PermalinkSource>,
) -> (Arc<GraphStore>, Arc<ChangeService>) {
    let store = Arc::new(GraphStore::new());
    let service = Arc::new(ChangeService::new(
        registry(),
        Arc::clone(&store),
        permalinks,
    ));
    service.bootstrap();
    (store, service)
}

/// A well-formed message event envelope on the source channel.
pub fn message(event_id: &str, ts: &str, user: &str, text: &str) -> InboundEnvelope {
    message_in(CHANNEL, event_id, ts, user, text)
}

pub fn message_in(
    channel: &str,
    event_id: &str,
    ts: &str,
    user: &str,
    text: &str,
) -> InboundEnvelope {
    envelope(serde_json::json!({
        "type": "event_callback",
        "event_id": event_id,
        "event": {
            "type": "message",
            "channel": channel,
            "user": user,
            "ts": ts,
            "text": text,
        },
    }))
}

pub fn envelope(value: serde_json::Value) -> InboundEnvelope {
    serde_json::from_value(value).expect("fixture envelope")
}
