//! Internal HTTP endpoints served next to the Telegram webhook.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use spendwise_core::{
    backend::SECRET_HEADER, domain::ChatId, errors::Error, security::secret_matches,
};

use crate::router::AppState;

/// Body of `POST /internal/send-message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub chat_id: i64,
    #[serde(default)]
    pub message: String,
    /// Accepted for compatibility; messages are always sent as plain text.
    #[serde(default)]
    pub options: Option<serde_json::Map<String, Value>>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/internal/send-message", post(send_message))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !secret_matches(provided, &state.cfg.api_secret) {
        warn!("unauthorized internal API request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        );
    }

    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            warn!("invalid send-message request: {e}");
            return missing_fields();
        }
    };

    match state
        .service
        .push_notification(ChatId(req.chat_id), &req.message)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(json!({ "success": true }))),
        Err(Error::Validation(_)) => {
            warn!(chat_id = req.chat_id, "send-message request missing fields");
            missing_fields()
        }
        Err(e) => {
            warn!(chat_id = req.chat_id, "failed to send internal message: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to send message" })),
            )
        }
    }
}

fn missing_fields() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "missing fields" })),
    )
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex, time::Duration};

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use chrono::FixedOffset;
    use tower::ServiceExt;

    use spendwise_core::{
        backend::{
            BatchOutcome, ExpenseBackend, MarkDoneRequest, NotificationPayload, SummaryPeriod,
        },
        config::Config,
        domain::{MessageId, MessageRef},
        expense::ExpenseRecord,
        messaging::{
            port::MessagingPort,
            types::{MessagingCapabilities, TextFormat},
        },
        service::ExpenseBot,
        Result,
    };

    use super::*;

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_edit: false,
                supports_reactions: false,
            }
        }

        async fn send_text(
            &self,
            chat_id: ChatId,
            text: &str,
            _format: TextFormat,
        ) -> Result<MessageRef> {
            if self.fail {
                return Err(Error::External("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id.0, text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn edit_text(&self, _msg: MessageRef, _text: &str, _format: TextFormat) -> Result<()> {
            Ok(())
        }

        async fn set_reaction(&self, _msg: MessageRef, _emoji: &str) -> Result<()> {
            Ok(())
        }

        async fn answer_callback_query(&self, _id: &str, _text: Option<&str>) -> Result<()> {
            Ok(())
        }
    }

    struct UnusedBackend;

    #[async_trait]
    impl ExpenseBackend for UnusedBackend {
        async fn create_batch(&self, _records: &[ExpenseRecord]) -> Result<BatchOutcome> {
            Ok(BatchOutcome::Saved { message: None })
        }

        async fn mark_reminder_done(&self, _req: &MarkDoneRequest) -> Result<Option<String>> {
            Ok(None)
        }

        async fn reminders(&self) -> Result<NotificationPayload> {
            Ok(NotificationPayload::default())
        }

        async fn summary(&self, _period: SummaryPeriod) -> Result<String> {
            Ok(String::new())
        }
    }

    fn app(messenger: Arc<RecordingMessenger>) -> Router {
        let cfg = Arc::new(Config {
            bot_token: "token".to_string(),
            bot_url: "https://bot.example".to_string(),
            allowed_chat_ids: vec![1],
            user_names: HashMap::new(),
            api_url: "http://backend".to_string(),
            api_secret: "s3cret".to_string(),
            api_timeout: Duration::from_secs(30),
            port: 8080,
            reference_offset: FixedOffset::east_opt(0).unwrap(),
        });
        let service = Arc::new(ExpenseBot::new(
            cfg.clone(),
            messenger,
            Arc::new(UnusedBackend),
        ));
        routes(Arc::new(AppState { cfg, service }))
    }

    fn send_request(secret: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/internal/send-message")
            .header("content-type", "application/json");
        if let Some(s) = secret {
            req = req.header(SECRET_HEADER, s);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn delivers_message_with_valid_secret() {
        let messenger = Arc::new(RecordingMessenger::default());
        let resp = app(messenger.clone())
            .oneshot(send_request(
                Some("s3cret"),
                r#"{"chatId": 77, "message": "Rent due tomorrow", "options": {}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            *messenger.sent.lock().unwrap(),
            vec![(77, "Rent due tomorrow".to_string())]
        );
    }

    #[tokio::test]
    async fn rejects_wrong_or_missing_secret() {
        let messenger = Arc::new(RecordingMessenger::default());
        for secret in [None, Some("nope")] {
            let resp = app(messenger.clone())
                .oneshot(send_request(secret, r#"{"chatId": 77, "message": "hi"}"#))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        assert!(messenger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_incomplete_bodies() {
        let messenger = Arc::new(RecordingMessenger::default());
        for body in [r#"{"chatId": 77}"#, r#"{"message": "hi"}"#, "not json"] {
            let resp = app(messenger.clone())
                .oneshot(send_request(Some("s3cret"), body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }

    #[tokio::test]
    async fn transport_failure_is_a_server_error() {
        let messenger = Arc::new(RecordingMessenger {
            fail: true,
            ..RecordingMessenger::default()
        });
        let resp = app(messenger)
            .oneshot(send_request(Some("s3cret"), r#"{"chatId": 77, "message": "hi"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let messenger = Arc::new(RecordingMessenger::default());
        let resp = app(messenger)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
