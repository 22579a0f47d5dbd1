//! Chat front end proxying a fixed set of read queries to the HTTP API.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::BotConfig;

pub mod client;
pub mod command;
pub mod telegram;

use client::ApiClient;
use command::{Command, HELP_TEXT};
use telegram::TelegramClient;

const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Reply text for one incoming chat message.
pub async fn reply_to(api: &ApiClient, text: &str) -> String {
    let cmd = match Command::parse(text) {
        Ok(cmd) => cmd,
        Err(e) => return e.to_string(),
    };
    match cmd.api_path() {
        Some(path) => api.fetch_text(&path).await,
        None => HELP_TEXT.to_string(),
    }
}

pub async fn run(config: BotConfig) -> anyhow::Result<()> {
    let api = ApiClient::new(&config.api_base_url)?;
    let tg = TelegramClient::new(&config.telegram_token)?;

    let me = tg.get_me().await?;
    info!(username = ?me.username, api = %config.api_base_url, "bot started");

    let mut offset = 0;
    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
            res = tg.get_updates(offset, config.poll_timeout_secs) => res,
        };

        let updates = match updates {
            Ok(u) => u,
            Err(e) => {
                error!(error = %e, "telegram polling error");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(msg) = update.message else { continue };
            let Some(text) = msg.text else { continue };

            let reply = reply_to(&api, text.trim()).await;
            if let Err(e) = tg.send_message(msg.chat.id, &reply).await {
                warn!(error = %e, chat_id = msg.chat.id, "send reply failed");
            }
        }
    }
}
