//! Where a session sends notices that are not the answer to a command:
//! "now playing", skipped tracks, idle disconnects.

use poise::serenity_prelude as serenity;
use serenity::all::{CreateEmbed, CreateMessage, Http};
use serenity::async_trait;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use tracing::warn;

/// A text or embed message.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Embed(CreateEmbed),
}

impl From<CreateEmbed> for Reply {
    fn from(embed: CreateEmbed) -> Self {
        Reply::Embed(embed)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

/// Anything that can deliver a [`Reply`]. Delivery failures are the sink's
/// problem; the session does not wait on or react to them.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn respond(&self, reply: Reply);
}

/// Posts replies to a Discord text channel.
pub struct ChannelReplySink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelReplySink {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ReplySink for ChannelReplySink {
    async fn respond(&self, reply: Reply) {
        let message = match reply {
            Reply::Text(text) => CreateMessage::new().content(text),
            Reply::Embed(embed) => CreateMessage::new().embed(embed),
        };

        if let Err(e) = self.channel_id.send_message(&self.http, message).await {
            warn!("Failed to send message to channel {}: {}", self.channel_id, e);
        }
    }
}
