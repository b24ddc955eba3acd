use crate::{
    domain::{ChatId, MessageRef, UserId},
    identity::SenderProfile,
};

/// Inbound text message, already stripped of transport specifics.
#[derive(Clone, Debug)]
pub struct IncomingText {
    pub message: MessageRef,
    pub sender: SenderProfile,
    pub text: String,
}

impl IncomingText {
    pub fn chat_id(&self) -> ChatId {
        self.message.chat_id
    }
}

/// Inline-button press.
#[derive(Clone, Debug)]
pub struct IncomingCallback {
    pub callback_id: String,
    pub user_id: UserId,
    /// The message carrying the button, when Telegram still has it.
    pub message: Option<MessageRef>,
    pub data: String,
}

/// How the transport should interpret message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Telegram legacy Markdown, as produced by the backend.
    Markdown,
}

/// What a messenger implementation can do beyond sending text.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub supports_reactions: bool,
}
