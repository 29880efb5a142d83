//! Collaborator-facing dispatcher: one per process, passed to whatever
//! needs to register endpoints or fire events.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::config::DispatcherConfig;
use crate::error::Result;
use crate::queue::DispatchQueue;
use crate::registry::Registry;
use crate::router;
use crate::types::{
    DeliveryAttempt, DispatcherStats, RegisterOptions, Registration, TestOutcome,
};
use crate::worker::{self, DeliveryWorker};

pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Registry,
    queue: Arc<DispatchQueue>,
    client: Client,
}

impl Dispatcher {
    /// Build a dispatcher with default configuration and start its workers.
    ///
    /// Must be called within a tokio runtime; the drain loops are spawned
    /// here and run for the life of the process.
    pub fn new() -> Result<Self> {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Result<Self> {
        let client = worker::build_client(&config)?;
        let queue = Arc::new(DispatchQueue::new());

        for _ in 0..config.worker_count {
            let worker =
                DeliveryWorker::new(Arc::clone(&queue), client.clone(), config.clone());
            tokio::spawn(worker.run());
        }

        Ok(Self {
            config,
            registry: Registry::new(),
            queue,
            client,
        })
    }

    /// Register a destination endpoint for a tenant's events.
    pub async fn register(
        &self,
        tenant_id: &str,
        event_type: &str,
        url: &str,
        options: RegisterOptions,
    ) -> Result<Registration> {
        let registration = self
            .registry
            .register(tenant_id, event_type, url, options)
            .await?;
        tracing::info!(
            tenant_id,
            registration_id = %registration.id,
            event_type,
            url,
            "webhook registered"
        );
        Ok(registration)
    }

    /// Remove a registration. Already-queued attempts are unaffected.
    pub async fn remove(&self, tenant_id: &str, registration_id: &str) -> bool {
        let removed = self.registry.remove(tenant_id, registration_id).await;
        if removed {
            tracing::info!(tenant_id, registration_id, "webhook removed");
        }
        removed
    }

    pub async fn list(&self, tenant_id: &str) -> Vec<Registration> {
        self.registry.list(tenant_id).await
    }

    /// Deactivate or reactivate a registration. Only affects future routing.
    pub async fn set_active(&self, tenant_id: &str, registration_id: &str, active: bool) -> bool {
        self.registry
            .set_active(tenant_id, registration_id, active)
            .await
    }

    /// Fan an event out to every matching active registration.
    ///
    /// Fire-and-forget: enqueues one attempt per match and returns without
    /// touching the network. Delivery failures are only observable via
    /// logs. Within a registration, retried attempts may be delivered after
    /// later events that needed no retry.
    pub async fn trigger_event(&self, tenant_id: &str, event_type: &str, data: Value) {
        let registrations = self.registry.list(tenant_id).await;
        let attempts = router::route(&registrations, event_type, &data);
        if attempts.is_empty() {
            return;
        }

        tracing::debug!(
            tenant_id,
            event_type,
            matches = attempts.len(),
            "event fanned out"
        );
        for attempt in attempts {
            self.queue.enqueue(attempt);
        }
    }

    /// Send a synthetic `test` event through the normal signing and send
    /// path, once, and report the outcome synchronously. No retry is ever
    /// scheduled for a test send.
    pub async fn test_endpoint(&self, registration: &Registration) -> TestOutcome {
        let data = serde_json::json!({
            "test": true,
            "message": "webhook test delivery",
            "timestamp": Utc::now(),
        });
        let attempt = DeliveryAttempt::new(registration, "test", data);
        worker::send_once(&self.client, &attempt).await
    }

    pub async fn stats(&self) -> DispatcherStats {
        let (total, active) = self.registry.counts().await;
        DispatcherStats {
            total_registrations: total,
            active_registrations: active,
            queued: self.queue.depth(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}
