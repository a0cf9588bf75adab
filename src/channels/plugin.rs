use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::Dispatcher;

/// Static metadata about a chat channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelMeta {
    /// Human-readable channel name (e.g. "Telegram").
    pub name: String,
    pub description: String,
    /// Whether the channel has what it needs to start.
    pub enabled: bool,
}

/// Bridge between a messaging platform and the [`Dispatcher`].
///
/// Implementations recognise the invocation prefix in inbound messages,
/// hand the remaining text to [`Dispatcher::handle`] and send the reply
/// back to the originating chat.
#[async_trait]
pub trait ChatChannel: Send + Sync + 'static {
    /// Unique identifier for this channel (e.g. "telegram").
    fn id(&self) -> &str;

    fn meta(&self) -> ChannelMeta;

    /// Receive and answer messages until the process is asked to stop.
    async fn run(&self, dispatcher: Dispatcher) -> Result<()>;
}
