//! Delivery worker: drains the queue and performs signed HTTP POSTs.
//!
//! Per attempt the worker serializes the wire body once, signs those exact
//! bytes, sends, and classifies the result: success discards the attempt,
//! failure either schedules a retry with an increased delay or abandons the
//! attempt once the send budget is spent. Nothing here ever propagates back
//! to the code that triggered the event.

use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;

use crate::config::{DispatcherConfig, RetryPolicy};
use crate::queue::DispatchQueue;
use crate::signature;
use crate::types::{DeliveryAttempt, DeliveryPayload, TestOutcome};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const EVENT_HEADER: &str = "x-webhook-event";
pub const ID_HEADER: &str = "x-webhook-id";

/// Why a send did not land in [200, 300).
#[derive(Debug)]
pub(crate) struct SendFailure {
    pub status: Option<u16>,
    pub error: String,
}

pub(crate) struct DeliveryWorker {
    queue: Arc<DispatchQueue>,
    client: Client,
    config: DispatcherConfig,
}

impl DeliveryWorker {
    pub fn new(queue: Arc<DispatchQueue>, client: Client, config: DispatcherConfig) -> Self {
        Self {
            queue,
            client,
            config,
        }
    }

    /// Drain loop. Runs until the queue shuts down.
    pub async fn run(self) {
        while let Some(attempt) = self.queue.dequeue().await {
            self.process(attempt).await;
        }
    }

    async fn process(&self, mut attempt: DeliveryAttempt) {
        match send_attempt(&self.client, &attempt).await {
            Ok(status) => {
                tracing::info!(
                    tenant_id = %attempt.tenant_id,
                    registration_id = %attempt.registration_id,
                    event_type = %attempt.event_type,
                    status,
                    attempt_count = attempt.attempt_count,
                    url = %attempt.target_url,
                    "webhook delivered"
                );
            }
            Err(failure) => {
                attempt.attempt_count += 1;

                let budget_left = attempt.attempt_count < self.config.max_attempts;
                let retryable = is_retryable(failure.status, self.config.retry_policy);

                if budget_left && retryable {
                    let delay = self.config.base_delay * attempt.attempt_count;
                    tracing::warn!(
                        tenant_id = %attempt.tenant_id,
                        registration_id = %attempt.registration_id,
                        event_type = %attempt.event_type,
                        error = %failure.error,
                        attempt_count = attempt.attempt_count,
                        delay_ms = delay.as_millis() as u64,
                        "delivery failed, retry scheduled"
                    );
                    attempt.enqueued_at = Utc::now();
                    self.queue.schedule_retry(attempt, delay);
                } else {
                    tracing::warn!(
                        tenant_id = %attempt.tenant_id,
                        registration_id = %attempt.registration_id,
                        event_type = %attempt.event_type,
                        error = %failure.error,
                        attempt_count = attempt.attempt_count,
                        url = %attempt.target_url,
                        "delivery abandoned"
                    );
                }
            }
        }
    }
}

/// Build the shared HTTP client used for all deliveries.
pub(crate) fn build_client(config: &DispatcherConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("webhook-dispatcher/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Execute a single signed send. `Ok` carries a 2xx status code.
pub(crate) async fn send_attempt(
    client: &Client,
    attempt: &DeliveryAttempt,
) -> Result<u16, SendFailure> {
    let payload = DeliveryPayload {
        event: attempt.event_type.clone(),
        chatbot_id: attempt.tenant_id.clone(),
        timestamp: Utc::now(),
        data: attempt.payload.clone(),
    };

    let body = serde_json::to_vec(&payload).map_err(|e| SendFailure {
        status: None,
        error: format!("payload serialization failed: {e}"),
    })?;

    let signature = signature::sign(&body, &attempt.secret);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(v) = HeaderValue::from_str(&signature) {
        headers.insert(SIGNATURE_HEADER, v);
    }
    if let Ok(v) = HeaderValue::from_str(&attempt.event_type) {
        headers.insert(EVENT_HEADER, v);
    }
    if let Ok(v) = HeaderValue::from_str(&attempt.registration_id) {
        headers.insert(ID_HEADER, v);
    }
    for (name, value) in &attempt.extra_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                headers.insert(n, v);
            }
            _ => {
                tracing::warn!(
                    registration_id = %attempt.registration_id,
                    header = %name,
                    "skipping invalid custom header"
                );
            }
        }
    }

    let response = client
        .post(&attempt.target_url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| SendFailure {
            status: None,
            error: classify_request_error(&e),
        })?;

    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        Ok(status)
    } else {
        Err(SendFailure {
            status: Some(status),
            error: format!("HTTP {status}"),
        })
    }
}

/// Single-shot send for endpoint tests: same signing and send path, no
/// retry scheduling, outcome returned to the caller.
pub(crate) async fn send_once(client: &Client, attempt: &DeliveryAttempt) -> TestOutcome {
    match send_attempt(client, attempt).await {
        Ok(status) => TestOutcome {
            success: true,
            status_code: Some(status),
            error: None,
        },
        Err(failure) => TestOutcome {
            success: false,
            status_code: failure.status,
            error: Some(failure.error),
        },
    }
}

fn classify_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request error: {e}")
    }
}

/// Uniform policy retries every failure; TransientOnly gives up on 4xx
/// other than 408 and 429. Network-level failures are always retryable.
fn is_retryable(status: Option<u16>, policy: RetryPolicy) -> bool {
    match policy {
        RetryPolicy::Uniform => true,
        RetryPolicy::TransientOnly => match status {
            Some(408) | Some(429) | None => true,
            Some(s) => !(400..500).contains(&s),
        },
    }
}
