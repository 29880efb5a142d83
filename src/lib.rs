//! Multi-tenant webhook dispatcher.
//!
//! Application events are fanned out to tenant-registered HTTP endpoints
//! with at-least-once semantics: each delivery is an HMAC-SHA256-signed
//! JSON POST, failures are retried with a strictly increasing backoff, and
//! attempts that exhaust their send budget are abandoned with a log entry.
//! Event producers never block on (or learn about) delivery I/O.
//!
//! Construct one [`Dispatcher`] at process startup and pass it to whatever
//! needs to register endpoints or fire events:
//!
//! ```no_run
//! # async fn demo() -> Result<(), webhook_dispatcher::WebhookError> {
//! use webhook_dispatcher::{Dispatcher, RegisterOptions};
//!
//! let dispatcher = Dispatcher::new()?;
//! dispatcher
//!     .register("bot-42", "lead_captured", "https://crm.example.com/hook",
//!               RegisterOptions::default())
//!     .await?;
//! dispatcher
//!     .trigger_event("bot-42", "lead_captured", serde_json::json!({"email": "a@b.c"}))
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod queue;
pub mod registry;
pub mod router;
pub mod signature;
pub mod types;
mod worker;

pub use config::{DispatcherConfig, RetryPolicy};
pub use dispatcher::Dispatcher;
pub use error::WebhookError;
pub use events::ConversationSummary;
pub use types::{
    DeliveryAttempt, DeliveryPayload, DispatcherStats, RegisterOptions, Registration,
    TestOutcome, WILDCARD_EVENT,
};
pub use worker::{EVENT_HEADER, ID_HEADER, SIGNATURE_HEADER};
