//! Event vocabulary and convenience emitters for the owning application's
//! trigger points.

use chrono::Utc;
use serde_json::{json, Value};

use crate::dispatcher::Dispatcher;

pub const CONVERSATION_STARTED: &str = "conversation_started";
pub const CONVERSATION_ENDED: &str = "conversation_ended";
pub const LEAD_CAPTURED: &str = "lead_captured";
pub const KEYWORD_DETECTED: &str = "keyword_detected";
pub const MESSAGE_SENT: &str = "message_sent";
pub const MESSAGE_RECEIVED: &str = "message_received";
pub const TEST: &str = "test";

/// End-of-conversation details attached to `conversation_ended`.
#[derive(Debug, Clone, Default)]
pub struct ConversationSummary {
    pub message_count: u64,
    pub duration_secs: u64,
    pub resolved: bool,
}

impl Dispatcher {
    pub async fn conversation_started(&self, tenant_id: &str, session_id: &str, metadata: Value) {
        let mut data = json!({
            "sessionId": session_id,
            "startedAt": Utc::now(),
        });
        merge_into(&mut data, metadata);
        self.trigger_event(tenant_id, CONVERSATION_STARTED, data).await;
    }

    pub async fn conversation_ended(
        &self,
        tenant_id: &str,
        session_id: &str,
        summary: ConversationSummary,
    ) {
        let data = json!({
            "sessionId": session_id,
            "endedAt": Utc::now(),
            "messageCount": summary.message_count,
            "duration": summary.duration_secs,
            "resolved": summary.resolved,
        });
        self.trigger_event(tenant_id, CONVERSATION_ENDED, data).await;
    }

    pub async fn lead_captured(&self, tenant_id: &str, lead: Value) {
        let data = json!({
            "lead": lead,
            "capturedAt": Utc::now(),
        });
        self.trigger_event(tenant_id, LEAD_CAPTURED, data).await;
    }

    pub async fn keyword_detected(
        &self,
        tenant_id: &str,
        keyword: &str,
        message: &str,
        context: Value,
    ) {
        let mut data = json!({
            "keyword": keyword,
            "message": message,
            "detectedAt": Utc::now(),
        });
        merge_into(&mut data, context);
        self.trigger_event(tenant_id, KEYWORD_DETECTED, data).await;
    }

    pub async fn message_sent(&self, tenant_id: &str, session_id: &str, message: &str) {
        let data = json!({
            "sessionId": session_id,
            "message": message,
            "sentAt": Utc::now(),
        });
        self.trigger_event(tenant_id, MESSAGE_SENT, data).await;
    }

    pub async fn message_received(&self, tenant_id: &str, session_id: &str, message: &str) {
        let data = json!({
            "sessionId": session_id,
            "message": message,
            "receivedAt": Utc::now(),
        });
        self.trigger_event(tenant_id, MESSAGE_RECEIVED, data).await;
    }
}

/// Merge the entries of `extra` (if it is an object) into `data`, with
/// `extra` winning on key collisions.
fn merge_into(data: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(entries)) = (data, extra) {
        for (key, value) in entries {
            target.insert(key, value);
        }
    }
}
