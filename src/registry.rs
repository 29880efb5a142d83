//! In-memory registry of webhook registrations, partitioned by tenant.
//!
//! The registry exclusively owns `Registration` lifecycle. All operations
//! are safe to call concurrently with dispatch in progress; fan-out reads a
//! cloned snapshot, so mutation never corrupts an iteration elsewhere.

use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use crate::error::WebhookError;
use crate::types::{RegisterOptions, Registration};

#[derive(Default)]
pub struct Registry {
    inner: RwLock<HashMap<String, Vec<Registration>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a registration for a tenant.
    ///
    /// Duplicates are permitted: registering the same event/url twice yields
    /// two independent registrations.
    pub async fn register(
        &self,
        tenant_id: &str,
        event_type: &str,
        url: &str,
        options: RegisterOptions,
    ) -> Result<Registration, WebhookError> {
        if event_type.trim().is_empty() {
            return Err(WebhookError::InvalidEventType(
                "event type must not be empty".to_string(),
            ));
        }
        validate_url(url)?;

        let registration = Registration {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            event_type: event_type.to_string(),
            target_url: url.to_string(),
            secret: options.secret.unwrap_or_else(generate_secret),
            extra_headers: options.headers,
            active: true,
            created_at: Utc::now(),
        };

        let mut map = self.inner.write().await;
        map.entry(tenant_id.to_string())
            .or_default()
            .push(registration.clone());

        Ok(registration)
    }

    /// Remove a registration. Returns false for an unknown tenant or id.
    pub async fn remove(&self, tenant_id: &str, registration_id: &str) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(tenant_id) {
            Some(list) => {
                let before = list.len();
                list.retain(|r| r.id != registration_id);
                list.len() < before
            }
            None => false,
        }
    }

    /// All registrations for a tenant, in registration order. Empty for
    /// unknown tenants.
    pub async fn list(&self, tenant_id: &str) -> Vec<Registration> {
        self.inner
            .read()
            .await
            .get(tenant_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Flip a registration's active flag. Returns false if not found.
    pub async fn set_active(&self, tenant_id: &str, registration_id: &str, active: bool) -> bool {
        let mut map = self.inner.write().await;
        if let Some(list) = map.get_mut(tenant_id) {
            if let Some(reg) = list.iter_mut().find(|r| r.id == registration_id) {
                reg.active = active;
                return true;
            }
        }
        false
    }

    /// Totals across all tenants: (registrations, active registrations).
    pub async fn counts(&self) -> (usize, usize) {
        let map = self.inner.read().await;
        let total = map.values().map(Vec::len).sum();
        let active = map
            .values()
            .flat_map(|list| list.iter())
            .filter(|r| r.active)
            .count();
        (total, active)
    }
}

fn validate_url(url: &str) -> Result<(), WebhookError> {
    if url.trim().is_empty() {
        return Err(WebhookError::InvalidUrl("url must not be empty".to_string()));
    }
    let parsed =
        Url::parse(url).map_err(|e| WebhookError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(WebhookError::InvalidUrl(format!(
            "unsupported scheme: {scheme}"
        ))),
    }
}

/// 32 random bytes from the OS CSPRNG, hex-encoded.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
