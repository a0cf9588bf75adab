mod plugin;
mod telegram;

pub use plugin::{ChannelMeta, ChatChannel};
pub use telegram::{strip_invocation, truncate_reply, TelegramChannel};

use anyhow::{bail, Result};
use tracing::info;

use crate::config::Config;
use crate::dispatch::Dispatcher;

/// Channels configured in `config`, whether enabled or not.
pub fn configured_channels(config: &Config) -> Vec<Box<dyn ChatChannel>> {
    vec![Box::new(TelegramChannel::new(config))]
}

/// Run the enabled channel until shutdown.
pub async fn run(config: &Config, dispatcher: Dispatcher) -> Result<()> {
    let mut enabled = configured_channels(config)
        .into_iter()
        .filter(|channel| channel.meta().enabled);

    let Some(channel) = enabled.next() else {
        bail!("no chat channel is enabled; set telegram.botToken or TELEGRAM_BOT_TOKEN");
    };

    let meta = channel.meta();
    info!(
        channel = channel.id(),
        name = %meta.name,
        description = %meta.description,
        "starting channel"
    );
    channel.run(dispatcher).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[tokio::test]
    async fn run_refuses_without_a_token() {
        let config = Config::default();
        let dispatcher = Dispatcher::new(Store::open_in_memory().unwrap(), &config);
        let err = run(&config, dispatcher).await.unwrap_err();
        assert!(err.to_string().contains("no chat channel is enabled"));
    }

    #[test]
    fn telegram_is_always_configured() {
        let ids: Vec<String> = configured_channels(&Config::default())
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["telegram".to_string()]);
    }
}
