use std::sync::Arc;

use teloxide::{prelude::*, types::User};

use spendwise_core::{
    domain::{ChatId, MessageId, MessageRef},
    identity::SenderProfile,
    messaging::types::IncomingText,
};

use crate::router::AppState;

fn sender_profile(user: &User) -> SenderProfile {
    SenderProfile {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user = msg.from();
    let incoming = IncomingText {
        message: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        sender: user.map(sender_profile).unwrap_or_default(),
        text: text.to_string(),
    };

    state.service.handle_text(incoming).await;
    Ok(())
}
