use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{MessagingCapabilities, TextFormat},
    Result,
};

/// Outbound side of the chat transport.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str, format: TextFormat)
        -> Result<MessageRef>;
    async fn edit_text(&self, msg: MessageRef, text: &str, format: TextFormat) -> Result<()>;

    async fn set_reaction(&self, msg: MessageRef, emoji: &str) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
