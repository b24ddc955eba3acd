//! SpendWise backend port and its wire types.
//!
//! The HTTP client lives in `spendwise-api`; this module only knows the shapes
//! the backend speaks and how to turn them into typed results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{expense::ExpenseRecord, Result};

/// Header carrying the shared secret, in both directions.
pub const SECRET_HEADER: &str = "x-spendwise-secret";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryPeriod {
    Today,
    Month,
}

impl SummaryPeriod {
    pub fn path(self) -> &'static str {
        match self {
            Self::Today => "/api/summary/today",
            Self::Month => "/api/summary/month",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "daily",
            Self::Month => "monthly",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FirestoreTimestamp {
    pub seconds: i64,
    pub nanoseconds: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reminder {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sub_type: String,
    pub main_type: String,
    pub created_at: FirestoreTimestamp,
    pub paid_months: Vec<String>,
    pub active_months: Vec<String>,
    pub day_of_month_start: u32,
    pub day_of_month_end: u32,
    pub amount: f64,
    pub description: String,
    pub user_id: String,
    pub due_date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPayload {
    pub fcm_tokens: Vec<String>,
    pub telegram_user_ids: Vec<String>,
    pub reminders: Vec<Reminder>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDoneRequest {
    pub reminder_id: String,
    pub reminder_type: String,
    pub user_id: String,
}

impl MarkDoneRequest {
    /// Callback data format: `mark_done:<reminderId>:<reminderType>`.
    pub const CALLBACK_PREFIX: &'static str = "mark_done:";

    pub fn from_callback(data: &str, user_id: impl Into<String>) -> Option<Self> {
        let rest = data.strip_prefix(Self::CALLBACK_PREFIX)?;
        let (id, kind) = rest.split_once(':')?;
        if id.is_empty() || kind.is_empty() || kind.contains(':') {
            return None;
        }
        Some(Self {
            reminder_id: id.to_string(),
            reminder_type: kind.to_string(),
            user_id: user_id.into(),
        })
    }
}

/// Result of a batch submission the backend accepted at the HTTP level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Saved {
        message: Option<String>,
    },
    Rejected {
        error: Option<String>,
        details: Option<String>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BatchResponse {
    success: bool,
    message: String,
    error: String,
    details: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorResponse {
    error: String,
    details: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    markdown: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn parse_batch_outcome(body: &[u8]) -> Result<BatchOutcome> {
    let raw: BatchResponse = serde_json::from_slice(body)?;
    Ok(if raw.success {
        BatchOutcome::Saved {
            message: non_empty(raw.message),
        }
    } else {
        BatchOutcome::Rejected {
            error: non_empty(raw.error),
            details: non_empty(raw.details),
        }
    })
}

/// The backend's confirmation text for a mark-as-done call, if it sent one.
pub fn parse_mark_done_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MessageResponse>(body)
        .ok()
        .and_then(|r| non_empty(r.message))
}

pub fn parse_summary(body: &[u8]) -> Result<String> {
    Ok(serde_json::from_slice::<SummaryResponse>(body)?.markdown)
}

pub fn parse_notification_payload(body: &[u8]) -> Result<NotificationPayload> {
    Ok(serde_json::from_slice(body)?)
}

/// Message for a non-2xx response: `error[: details]` when the body carries one.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) if !e.error.is_empty() => {
            if e.details.is_empty() {
                e.error
            } else {
                format!("{}: {}", e.error, e.details)
            }
        }
        _ => format!("API error ({status}): {body}"),
    }
}

/// Hexagonal port for the SpendWise backend.
#[async_trait]
pub trait ExpenseBackend: Send + Sync {
    async fn create_batch(&self, records: &[ExpenseRecord]) -> Result<BatchOutcome>;

    /// Returns the backend's confirmation text, if any.
    async fn mark_reminder_done(&self, req: &MarkDoneRequest) -> Result<Option<String>>;

    async fn reminders(&self) -> Result<NotificationPayload>;

    /// Returns Markdown ready to forward to the chat.
    async fn summary(&self, period: SummaryPeriod) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_outcome_variants() {
        assert_eq!(
            parse_batch_outcome(br#"{"success":true,"message":"3 saved"}"#).unwrap(),
            BatchOutcome::Saved {
                message: Some("3 saved".to_string())
            }
        );
        assert_eq!(
            parse_batch_outcome(br#"{"success":true}"#).unwrap(),
            BatchOutcome::Saved { message: None }
        );
        assert_eq!(
            parse_batch_outcome(br#"{"success":false,"error":"bad","details":"why"}"#).unwrap(),
            BatchOutcome::Rejected {
                error: Some("bad".to_string()),
                details: Some("why".to_string())
            }
        );
        assert!(parse_batch_outcome(b"not json").is_err());
    }

    #[test]
    fn error_message_prefers_body() {
        assert_eq!(error_message(400, r#"{"error":"nope"}"#), "nope");
        assert_eq!(
            error_message(400, r#"{"error":"nope","details":"missing date"}"#),
            "nope: missing date"
        );
        assert_eq!(error_message(502, "gateway"), "API error (502): gateway");
        assert_eq!(error_message(500, r#"{"x":1}"#), r#"API error (500): {"x":1}"#);
    }

    #[test]
    fn mark_done_message_is_optional() {
        assert_eq!(
            parse_mark_done_message(br#"{"message":"Paid for *May*"}"#),
            Some("Paid for *May*".to_string())
        );
        assert_eq!(parse_mark_done_message(br#"{}"#), None);
        assert_eq!(parse_mark_done_message(b""), None);
    }

    #[test]
    fn callback_data_parsing() {
        let req = MarkDoneRequest::from_callback("mark_done:abc:bill", "42").unwrap();
        assert_eq!(req.reminder_id, "abc");
        assert_eq!(req.reminder_type, "bill");
        assert_eq!(req.user_id, "42");

        assert!(MarkDoneRequest::from_callback("mark_done:abc", "42").is_none());
        assert!(MarkDoneRequest::from_callback("mark_done:a:b:c", "42").is_none());
        assert!(MarkDoneRequest::from_callback("askuser:a:b", "42").is_none());

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"reminderId": "abc", "reminderType": "bill", "userId": "42"})
        );
    }

    #[test]
    fn reminder_payload_tolerates_missing_fields() {
        let p = parse_notification_payload(
            br#"{"reminders":[{"id":"r1","type":"bill","amount":1200.5,
                "description":"Rent","dayOfMonthStart":1,"dayOfMonthEnd":5,
                "createdAt":{"seconds":10,"nanoseconds":0}}]}"#,
        )
        .unwrap();
        assert!(p.fcm_tokens.is_empty());
        assert_eq!(p.reminders.len(), 1);
        assert_eq!(p.reminders[0].kind, "bill");
        assert_eq!(p.reminders[0].day_of_month_end, 5);
        assert_eq!(p.reminders[0].created_at.seconds, 10);
    }

    #[test]
    fn summary_requires_markdown() {
        assert_eq!(parse_summary(br#"{"markdown":"*Today*"}"#).unwrap(), "*Today*");
        assert!(parse_summary(br#"{}"#).is_err());
    }
}
