//! Telegram adapter (teloxide).
//!
//! This crate implements the `spendwise-core` MessagingPort over the Telegram Bot
//! API and hosts the webhook + internal HTTP endpoints.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod handlers;
pub mod router;
pub mod server;

use spendwise_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, TextFormat},
    },
    Result,
};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    token: String,
    http: reqwest::Client,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, token: impl Into<String>) -> Self {
        Self {
            bot,
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    #[allow(deprecated)] // the backend emits legacy Markdown
    fn parse_mode(format: TextFormat) -> Option<ParseMode> {
        match format {
            TextFormat::Plain => None,
            TextFormat::Markdown => Some(ParseMode::Markdown),
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            supports_reactions: true,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), text.to_string());
                if let Some(mode) = Self::parse_mode(format) {
                    req = req.parse_mode(mode);
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_text(&self, msg: MessageRef, text: &str, format: TextFormat) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            );
            if let Some(mode) = Self::parse_mode(format) {
                req = req.parse_mode(mode);
            }
            req
        })
        .await?;
        Ok(())
    }

    /// teloxide 0.12 predates `setMessageReaction`, so this goes to the Bot API directly.
    async fn set_reaction(&self, msg: MessageRef, emoji: &str) -> Result<()> {
        let url = format!("{TELEGRAM_API}/bot{}/setMessageReaction", self.token);
        let resp = self
            .http
            .post(url)
            .timeout(std::time::Duration::from_secs(10))
            .json(&reaction_payload(msg, emoji))
            .send()
            .await
            .map_err(|e| Error::External(format!("reaction request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "reaction API error ({status}): {}",
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

fn reaction_payload(msg: MessageRef, emoji: &str) -> serde_json::Value {
    serde_json::json!({
        "chat_id": msg.chat_id.0,
        "message_id": msg.message_id.0,
        "reaction": [{ "type": "emoji", "emoji": emoji }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_payload_shape() {
        let msg = MessageRef {
            chat_id: ChatId(-100),
            message_id: MessageId(9),
        };
        assert_eq!(
            reaction_payload(msg, "👍"),
            serde_json::json!({
                "chat_id": -100,
                "message_id": 9,
                "reaction": [{"type": "emoji", "emoji": "👍"}],
            })
        );
    }
}
