use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Event type that matches every event for a registration.
pub const WILDCARD_EVENT: &str = "*";

/// One tenant's subscription binding an event type (or `*`) to a destination URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub tenant_id: String,
    pub event_type: String,
    pub target_url: String,
    /// Per-registration signing key. Never included in delivery payloads.
    pub secret: String,
    /// Extra headers merged into every delivery request for this registration.
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// True if this registration should receive the given event.
    pub fn matches(&self, event_type: &str) -> bool {
        self.active && (self.event_type == event_type || self.event_type == WILDCARD_EVENT)
    }
}

/// Caller-supplied options for `register`.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Signing secret; generated (32 random bytes, hex) when absent.
    pub secret: Option<String>,
    pub headers: HashMap<String, String>,
}

/// One queued unit of delivery work.
///
/// Carries a snapshot of the registration fields it needs, so concurrent
/// registry edits never affect an attempt already in flight.
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub registration_id: String,
    pub tenant_id: String,
    pub target_url: String,
    pub secret: String,
    pub extra_headers: HashMap<String, String>,
    pub event_type: String,
    pub payload: Value,
    /// Starts at 0, incremented on each failed send.
    pub attempt_count: u32,
    /// Diagnostic only; FIFO order is the queue's concern.
    pub enqueued_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    /// Snapshot a registration into a fresh attempt for one event.
    pub fn new(registration: &Registration, event_type: &str, payload: Value) -> Self {
        Self {
            registration_id: registration.id.clone(),
            tenant_id: registration.tenant_id.clone(),
            target_url: registration.target_url.clone(),
            secret: registration.secret.clone(),
            extra_headers: registration.extra_headers.clone(),
            event_type: event_type.to_string(),
            payload,
            attempt_count: 0,
            enqueued_at: Utc::now(),
        }
    }
}

/// Wire body POSTed to destinations. These exact serialized bytes are also
/// what the signature covers, so receivers can re-derive them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub event: String,
    /// Tenant identifier; field name kept for destination compatibility.
    #[serde(rename = "chatbotId")]
    pub chatbot_id: String,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

/// Synchronous result of a single endpoint test send.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Diagnostic counters for the dispatcher.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DispatcherStats {
    pub total_registrations: usize,
    pub active_registrations: usize,
    /// Attempts currently queued or waiting on a retry timer.
    pub queued: usize,
}
