use std::borrow::Cow;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::dptree;
use teloxide::requests::{Requester, ResponseResult};
use teloxide::types::{Message, Update};
use teloxide::Bot;
use tracing::{debug, info};

use super::plugin::{ChannelMeta, ChatChannel};
use crate::config::{Config, TELEGRAM_MAX_TEXT};
use crate::dispatch::Dispatcher;

/// Telegram channel implementation using the Bot API via teloxide.
pub struct TelegramChannel {
    bot_token: Option<String>,
    command: String,
}

impl TelegramChannel {
    pub fn new(config: &Config) -> Self {
        Self {
            bot_token: config.telegram.bot_token.clone(),
            command: config.telegram.command.clone(),
        }
    }
}

/// How this bot is addressed in chats.
#[derive(Debug, Clone)]
struct Invocation {
    command: String,
    bot_username: Option<String>,
}

#[async_trait]
impl ChatChannel for TelegramChannel {
    fn id(&self) -> &str {
        "telegram"
    }

    fn meta(&self) -> ChannelMeta {
        ChannelMeta {
            name: "Telegram".to_string(),
            description: "Telegram Bot API channel (long polling)".to_string(),
            enabled: self.bot_token.is_some(),
        }
    }

    async fn run(&self, dispatcher: Dispatcher) -> Result<()> {
        let token = self
            .bot_token
            .as_deref()
            .context("Telegram bot token not configured (telegram.botToken or TELEGRAM_BOT_TOKEN)")?;

        let bot = Bot::new(token);
        let me = bot
            .get_me()
            .await
            .context("failed to reach the Telegram Bot API")?;

        let invocation = Invocation {
            command: self.command.clone(),
            bot_username: me.user.username.clone(),
        };
        info!(
            bot = invocation.bot_username.as_deref().unwrap_or("?"),
            command = %invocation.command,
            "Telegram channel starting"
        );

        let handler = Update::filter_message().endpoint(handle_message);
        teloxide::dispatching::Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![dispatcher, invocation])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram channel stopped");
        Ok(())
    }
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dispatcher: Dispatcher,
    invocation: Invocation,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(args) = strip_invocation(
        text,
        &invocation.command,
        invocation.bot_username.as_deref(),
    ) else {
        return Ok(());
    };

    debug!(chat_id = msg.chat.id.0, "Telegram: command received");
    let reply = dispatcher.handle(args).await;
    bot.send_message(msg.chat.id, truncate_reply(&reply.text, TELEGRAM_MAX_TEXT))
        .await?;
    Ok(())
}

/// Return the argument text after `/<command>` (or `/<command>@<bot>`), or
/// `None` when the message is not addressed to this bot.
pub fn strip_invocation<'a>(
    text: &'a str,
    command: &str,
    bot_username: Option<&str>,
) -> Option<&'a str> {
    let rest = text.trim_start().strip_prefix('/')?;
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (word, args) = rest.split_at(end);

    let name = match word.split_once('@') {
        Some((name, mention)) => {
            if let Some(username) = bot_username {
                if !mention.eq_ignore_ascii_case(username) {
                    return None;
                }
            }
            name
        }
        None => word,
    };

    name.eq_ignore_ascii_case(command).then_some(args)
}

/// Cut `text` to Telegram's message limit, counted in UTF-16 code units.
pub fn truncate_reply(text: &str, max_units: usize) -> Cow<'_, str> {
    if text.encode_utf16().count() <= max_units {
        return Cow::Borrowed(text);
    }

    // One unit is reserved for the ellipsis.
    let budget = max_units.saturating_sub(1);
    let mut used = 0;
    let mut end = 0;
    for (i, ch) in text.char_indices() {
        used += ch.len_utf16();
        if used > budget {
            break;
        }
        end = i + ch.len_utf8();
    }
    Cow::Owned(format!("{}…", &text[..end]))
}
