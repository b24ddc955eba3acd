//! SpendWise backend adapter.
//!
//! Implements `spendwise-core`'s `ExpenseBackend` over the backend's JSON HTTP API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Method};
use serde::Serialize;

use spendwise_core::{
    backend::{
        error_message, parse_batch_outcome, parse_mark_done_message, parse_notification_payload,
        parse_summary, BatchOutcome, ExpenseBackend, MarkDoneRequest, NotificationPayload,
        SummaryPeriod, SECRET_HEADER,
    },
    config::Config,
    errors::Error,
    expense::ExpenseRecord,
    Result,
};

const CREATE_BATCH_PATH: &str = "/api/expenses/create-batch-from-bot";
const MARK_DONE_PATH: &str = "/api/reminders/mark-as-done";
const REMINDERS_PATH: &str = "/api/reminders/get-payload";

#[derive(Clone, Debug)]
pub struct SpendWiseClient {
    base_url: String,
    api_secret: String,
    http: reqwest::Client,
}

impl SpendWiseClient {
    pub fn new(
        base_url: impl Into<String>,
        api_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_secret: api_secret.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.api_url, &cfg.api_secret, cfg.api_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request and return the body of a 2xx response.
    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let started = Instant::now();

        let mut req = self
            .http
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(SECRET_HEADER, &self.api_secret);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("request failed: {e}")))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("failed to read response: {e}")))?;

        tracing::debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "backend call finished"
        );

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(Error::Backend {
                message: error_message(status.as_u16(), &text),
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ExpenseBackend for SpendWiseClient {
    async fn create_batch(&self, records: &[ExpenseRecord]) -> Result<BatchOutcome> {
        let body = self
            .call(Method::POST, CREATE_BATCH_PATH, Some(records))
            .await?;
        parse_batch_outcome(&body)
    }

    async fn mark_reminder_done(&self, req: &MarkDoneRequest) -> Result<Option<String>> {
        let body = self.call(Method::POST, MARK_DONE_PATH, Some(req)).await?;
        Ok(parse_mark_done_message(&body))
    }

    async fn reminders(&self) -> Result<NotificationPayload> {
        let body = self.call::<()>(Method::GET, REMINDERS_PATH, None).await?;
        parse_notification_payload(&body)
    }

    async fn summary(&self, period: SummaryPeriod) -> Result<String> {
        let body = self.call::<()>(Method::GET, period.path(), None).await?;
        parse_summary(&body)
    }
}
