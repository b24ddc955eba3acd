use chrono::NaiveDate;
use serde::Serialize;

use super::interpreter::{interpret, LineRejection};
use crate::{errors::Error, Result};

/// Origin tag recorded on every expense created through the bot.
pub const BOT_SOURCE: &str = "bot";

/// Caller-supplied fields attached to every record of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseContext {
    date: String,
    source: String,
    user_name: String,
    channel_id: String,
}

impl ExpenseContext {
    pub fn new(
        date: NaiveDate,
        source: impl Into<String>,
        user_name: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Result<Self> {
        let channel_id = channel_id.into();
        if channel_id.trim().is_empty() {
            return Err(Error::Validation(
                "telegram chat ID cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            date: date.format("%Y-%m-%d").to_string(),
            source: source.into(),
            user_name: user_name.into(),
            channel_id,
        })
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }
}

/// An expense ready for the backend's batch-creation endpoint.
///
/// Field names are the backend's wire names.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub source: String,
    pub user_name: String,
    #[serde(rename = "telegramChatId")]
    pub channel_id: String,
}

/// A line that could not be interpreted.
///
/// `line_number` is the 1-based position among the non-blank lines of the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineFailure {
    pub line_number: usize,
    pub raw: String,
    pub reason: LineRejection,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchResult {
    pub records: Vec<ExpenseRecord>,
    pub failures: Vec<LineFailure>,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum BatchError {
    /// Nothing in the message could be read as an expense.
    #[error("no valid expenses found")]
    NoValidExpenses { failures: Vec<LineFailure> },
}

/// Interpret every non-blank line of `text`.
///
/// Blank lines are skipped entirely: they are neither failures nor numbered.
/// Partial success is allowed; a batch with no records is an error.
pub fn aggregate(
    text: &str,
    ctx: &ExpenseContext,
) -> std::result::Result<BatchResult, BatchError> {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    let entries = text.lines().filter(|line| !line.trim().is_empty());
    for (idx, line) in entries.enumerate() {
        match interpret(line) {
            Ok(parsed) => {
                let (amount, description) = parsed.into_parts();
                records.push(ExpenseRecord {
                    description,
                    amount,
                    date: ctx.date.clone(),
                    source: ctx.source.clone(),
                    user_name: ctx.user_name.clone(),
                    channel_id: ctx.channel_id.clone(),
                });
            }
            Err(reason) => failures.push(LineFailure {
                line_number: idx + 1,
                raw: line.to_string(),
                reason,
            }),
        }
    }

    if records.is_empty() {
        return Err(BatchError::NoValidExpenses { failures });
    }

    Ok(BatchResult { records, failures })
}
