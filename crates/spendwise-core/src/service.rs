//! Bot application service: routes inbound chat events to the expense parser
//! and the backend, and turns results into chat replies.

use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
    backend::{BatchOutcome, ExpenseBackend, MarkDoneRequest, SummaryPeriod},
    commands::{self, BotCommand, Inbound},
    config::Config,
    domain::{ChatId, MessageRef},
    errors::Error,
    expense::{aggregate, BatchError, ExpenseContext, BOT_SOURCE},
    formatting::{
        format_batch_reply, format_no_valid_expenses, format_rejection, format_reminders,
    },
    identity::resolve_display_name,
    messaging::{
        port::MessagingPort,
        types::{IncomingCallback, IncomingText, TextFormat},
    },
    security::is_authorized,
    Result,
};

const SINGLE_EXPENSE_REACTION: &str = "👍";
const SINGLE_EXPENSE_TEXT: &str = "✅ Expense logged successfully!";

pub struct ExpenseBot {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    backend: Arc<dyn ExpenseBackend>,
    clock: fn() -> DateTime<Utc>,
}

impl ExpenseBot {
    pub fn new(
        cfg: Arc<Config>,
        messenger: Arc<dyn MessagingPort>,
        backend: Arc<dyn ExpenseBackend>,
    ) -> Self {
        Self {
            cfg,
            messenger,
            backend,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Calendar day in the configured reference offset.
    pub fn today(&self) -> NaiveDate {
        (self.clock)()
            .with_timezone(&self.cfg.reference_offset)
            .date_naive()
    }

    pub async fn handle_text(&self, msg: IncomingText) {
        let chat_id = msg.chat_id();
        if !is_authorized(chat_id, &self.cfg.allowed_chat_ids) {
            warn!(
                chat_id = chat_id.0,
                username = msg.sender.username.as_deref().unwrap_or(""),
                "ignoring message from unauthorized chat"
            );
            return;
        }

        let started = Instant::now();
        let inbound = commands::classify(&msg.text);
        info!(chat_id = chat_id.0, ?inbound, "processing message");

        match inbound {
            Inbound::Command(BotCommand::Start) => {
                self.reply(chat_id, commands::START_TEXT).await;
            }
            Inbound::Command(BotCommand::Help) => {
                self.reply(chat_id, commands::HELP_TEXT).await;
            }
            Inbound::Command(BotCommand::Expense) => {
                self.reply(chat_id, commands::EXPENSE_HELP_TEXT).await;
            }
            Inbound::Command(BotCommand::Reminders) => self.send_reminders(chat_id).await,
            Inbound::Command(BotCommand::Summary) => {
                self.send_summary(chat_id, SummaryPeriod::Today).await;
            }
            Inbound::Command(BotCommand::Month) => {
                self.send_summary(chat_id, SummaryPeriod::Month).await;
            }
            Inbound::Expense => self.record_expenses(&msg).await,
            Inbound::Unknown => {
                self.reply(chat_id, commands::UNKNOWN_TEXT).await;
            }
        }

        info!(
            chat_id = chat_id.0,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "message processed"
        );
    }

    async fn record_expenses(&self, msg: &IncomingText) {
        let chat_id = msg.chat_id();
        let user_name = resolve_display_name(chat_id, &msg.sender, &self.cfg.user_names);

        let ctx = match ExpenseContext::new(self.today(), BOT_SOURCE, user_name, chat_id.to_string())
        {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(chat_id = chat_id.0, "cannot build expense context: {e}");
                self.reply(chat_id, &format!("❌ {e}")).await;
                return;
            }
        };

        let batch = match aggregate(&msg.text, &ctx) {
            Ok(batch) => batch,
            Err(BatchError::NoValidExpenses { failures }) => {
                info!(
                    chat_id = chat_id.0,
                    rejected = failures.len(),
                    "no valid expenses in message"
                );
                self.reply(chat_id, &format_no_valid_expenses(&failures))
                    .await;
                return;
            }
        };

        info!(
            chat_id = chat_id.0,
            records = batch.records.len(),
            rejected = batch.failures.len(),
            "submitting expense batch"
        );

        match self.backend.create_batch(&batch.records).await {
            Err(e) => {
                warn!(chat_id = chat_id.0, "saving expenses failed: {e}");
                self.reply(chat_id, &format!("❌ Error saving expenses: {e}"))
                    .await;
            }
            Ok(BatchOutcome::Saved { message }) => {
                if batch.records.len() == 1 && batch.failures.is_empty() {
                    self.acknowledge_single(msg.message).await;
                } else {
                    let text =
                        format_batch_reply(batch.records.len(), message.as_deref(), &batch.failures);
                    self.reply(chat_id, &text).await;
                }
            }
            Ok(BatchOutcome::Rejected { error, details }) => {
                warn!(
                    chat_id = chat_id.0,
                    error = error.as_deref().unwrap_or(""),
                    "backend rejected expense batch"
                );
                self.reply(chat_id, &format_rejection(error.as_deref(), details.as_deref()))
                    .await;
            }
        }
    }

    /// A lone expense gets a reaction instead of a reply, with a text fallback.
    async fn acknowledge_single(&self, message: MessageRef) {
        if !self.messenger.capabilities().supports_reactions {
            self.reply(message.chat_id, SINGLE_EXPENSE_TEXT).await;
            return;
        }
        if let Err(e) = self
            .messenger
            .set_reaction(message, SINGLE_EXPENSE_REACTION)
            .await
        {
            warn!(
                chat_id = message.chat_id.0,
                "reaction failed, falling back to text: {e}"
            );
            self.reply(message.chat_id, SINGLE_EXPENSE_TEXT).await;
        }
    }

    async fn send_summary(&self, chat_id: ChatId, period: SummaryPeriod) {
        let label = period.label();
        match self.backend.summary(period).await {
            Ok(markdown) => {
                self.send(chat_id, &markdown, TextFormat::Markdown).await;
            }
            Err(Error::Json(e)) => {
                warn!(chat_id = chat_id.0, "bad {label} summary response: {e}");
                self.reply(chat_id, &format!("❌ Error parsing {label} summary response"))
                    .await;
            }
            Err(e) => {
                warn!(chat_id = chat_id.0, "fetching {label} summary failed: {e}");
                self.reply(
                    chat_id,
                    &format!("Sorry, I couldn't fetch your {label} summary: {e}"),
                )
                .await;
            }
        }
    }

    async fn send_reminders(&self, chat_id: ChatId) {
        match self.backend.reminders().await {
            Ok(payload) => {
                info!(
                    chat_id = chat_id.0,
                    count = payload.reminders.len(),
                    "reminders fetched"
                );
                let today = (self.clock)()
                    .with_timezone(&self.cfg.reference_offset)
                    .day();
                self.reply(chat_id, &format_reminders(&payload, today))
                    .await;
            }
            Err(Error::Json(e)) => {
                warn!(chat_id = chat_id.0, "bad reminders response: {e}");
                self.reply(chat_id, "❌ Error parsing reminders").await;
            }
            Err(e) => {
                warn!(chat_id = chat_id.0, "fetching reminders failed: {e}");
                self.reply(chat_id, &format!("❌ Error fetching reminders: {e}"))
                    .await;
            }
        }
    }

    /// Inline-button press. Only `mark_done:<id>:<type>` is understood.
    pub async fn handle_callback(&self, cb: IncomingCallback) {
        let Some(message) = cb.message else {
            self.answer(&cb.callback_id, None).await;
            return;
        };

        let chat_id = message.chat_id;
        if !is_authorized(chat_id, &self.cfg.allowed_chat_ids) {
            warn!(
                chat_id = chat_id.0,
                user_id = cb.user_id.0,
                "ignoring callback from unauthorized chat"
            );
            return;
        }

        if !cb.data.starts_with(MarkDoneRequest::CALLBACK_PREFIX) {
            warn!(chat_id = chat_id.0, data = %cb.data, "unknown callback action");
            self.answer(&cb.callback_id, Some("Invalid action.")).await;
            return;
        }

        let Some(req) = MarkDoneRequest::from_callback(&cb.data, chat_id.to_string()) else {
            warn!(chat_id = chat_id.0, data = %cb.data, "malformed callback data");
            self.answer(&cb.callback_id, Some("Invalid format.")).await;
            return;
        };

        self.answer(&cb.callback_id, Some("Processing...")).await;
        info!(
            chat_id = chat_id.0,
            reminder_id = %req.reminder_id,
            reminder_type = %req.reminder_type,
            "marking reminder as done"
        );

        let (text, format) = match self.backend.mark_reminder_done(&req).await {
            Ok(Some(m)) => (format!("✅ {m}"), TextFormat::Markdown),
            Ok(None) => ("✅ Marked as done.".to_string(), TextFormat::Plain),
            Err(e) => {
                warn!(reminder_id = %req.reminder_id, "mark as done failed: {e}");
                (format!("❌ Error: {e}"), TextFormat::Plain)
            }
        };

        if !self.messenger.capabilities().supports_edit {
            self.send(chat_id, &text, format).await;
            return;
        }
        if let Err(e) = self.messenger.edit_text(message, &text, format).await {
            warn!(chat_id = chat_id.0, "failed to edit reminder message: {e}");
        }
    }

    /// Outbound notification requested by the backend.
    pub async fn push_notification(&self, chat_id: ChatId, message: &str) -> Result<MessageRef> {
        if chat_id.0 == 0 || message.trim().is_empty() {
            return Err(Error::Validation("missing fields".to_string()));
        }
        let sent = self
            .messenger
            .send_text(chat_id, message, TextFormat::Plain)
            .await?;
        info!(chat_id = chat_id.0, "internal message sent");
        Ok(sent)
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        self.send(chat_id, text, TextFormat::Plain).await;
    }

    async fn send(&self, chat_id: ChatId, text: &str, format: TextFormat) {
        if let Err(e) = self.messenger.send_text(chat_id, text, format).await {
            warn!(chat_id = chat_id.0, "failed to send reply: {e}");
        }
    }

    async fn answer(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.messenger.answer_callback_query(callback_id, text).await {
            warn!("failed to answer callback query: {e}");
        }
    }
}
