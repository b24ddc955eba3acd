//! Telegram update handlers.
//!
//! Each handler converts a teloxide update into the transport-neutral types
//! from `spendwise-core` and hands it to the `ExpenseBot` service.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod callback;
mod text;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.text().is_some() {
        return text::handle_text(msg, state).await;
    }

    tracing::debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
    Ok(())
}
