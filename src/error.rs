//! Error types for the dispatcher.

/// Errors surfaced synchronously to callers of the registration API.
///
/// Delivery failures are deliberately absent: `trigger_event` is
/// fire-and-forget and nothing from the delivery path ever propagates back
/// into the call site that produced the event.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, WebhookError>;
