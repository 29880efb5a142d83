//! Event fan-out: match an incoming event against a tenant's registrations.

use serde_json::Value;

use crate::types::{DeliveryAttempt, Registration};

/// Produce one delivery attempt per matching active registration.
///
/// A registration matches on an exact event-type hit or the wildcard `*`.
/// Each attempt carries a by-value snapshot of the registration, so later
/// registry edits cannot touch work already fanned out. Zero matches is a
/// silent no-op.
pub fn route(
    registrations: &[Registration],
    event_type: &str,
    data: &Value,
) -> Vec<DeliveryAttempt> {
    registrations
        .iter()
        .filter(|r| r.matches(event_type))
        .map(|r| DeliveryAttempt::new(r, event_type, data.clone()))
        .collect()
}
