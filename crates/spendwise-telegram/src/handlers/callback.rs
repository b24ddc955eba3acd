use std::sync::Arc;

use teloxide::{prelude::*, types::CallbackQuery};

use spendwise_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::IncomingCallback,
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let incoming = IncomingCallback {
        callback_id: q.id.clone(),
        user_id: UserId(q.from.id.0 as i64),
        message: q.message.as_ref().map(|m| MessageRef {
            chat_id: ChatId(m.chat.id.0),
            message_id: MessageId(m.id.0),
        }),
        data: q.data.clone().unwrap_or_default(),
    };

    state.service.handle_callback(incoming).await;
    Ok(())
}
