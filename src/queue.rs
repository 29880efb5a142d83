//! FIFO dispatch queue for delivery attempts.
//!
//! Two insertion paths: immediate `enqueue` from the router, and
//! timer-delayed `schedule_retry` from the worker. Several drain loops may
//! share the consuming end; the channel guarantees each attempt is handed
//! to exactly one of them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::types::DeliveryAttempt;

pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<DeliveryAttempt>,
    rx: Mutex<mpsc::UnboundedReceiver<DeliveryAttempt>>,
    /// Attempts queued or waiting on a retry timer.
    depth: Arc<AtomicUsize>,
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            depth: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Insert an attempt at the back of the queue. O(1), never blocks.
    ///
    /// The queue is unbounded: event producers never experience
    /// backpressure, matching the fire-and-forget contract.
    pub fn enqueue(&self, attempt: DeliveryAttempt) {
        self.depth.fetch_add(1, Ordering::Relaxed);
        // Send fails only once all receivers are gone, i.e. during teardown.
        let _ = self.tx.send(attempt);
    }

    /// Re-insert an attempt after `delay`. The attempt stays invisible to
    /// consumers until the timer fires.
    pub fn schedule_retry(&self, attempt: DeliveryAttempt, delay: Duration) {
        self.depth.fetch_add(1, Ordering::Relaxed);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(attempt);
        });
    }

    /// Pop the oldest ready attempt, suspending while the queue is empty.
    /// Returns `None` once the queue has shut down.
    pub async fn dequeue(&self) -> Option<DeliveryAttempt> {
        let attempt = self.rx.lock().await.recv().await;
        if attempt.is_some() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
        }
        attempt
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Registration;
    use chrono::Utc;
    use std::collections::HashMap;

    fn attempt(event_type: &str) -> DeliveryAttempt {
        let registration = Registration {
            id: "reg-1".to_string(),
            tenant_id: "bot-1".to_string(),
            event_type: event_type.to_string(),
            target_url: "http://127.0.0.1:9/hook".to_string(),
            secret: "secret".to_string(),
            extra_headers: HashMap::new(),
            active: true,
            created_at: Utc::now(),
        };
        DeliveryAttempt::new(&registration, event_type, serde_json::json!({}))
    }

    #[tokio::test]
    async fn fifo_order() {
        let queue = DispatchQueue::new();
        queue.enqueue(attempt("first"));
        queue.enqueue(attempt("second"));

        assert_eq!(queue.depth(), 2);
        assert_eq!(queue.dequeue().await.unwrap().event_type, "first");
        assert_eq!(queue.dequeue().await.unwrap().event_type, "second");
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn retry_delay_is_honored() {
        let queue = DispatchQueue::new();
        queue.schedule_retry(attempt("retried"), Duration::from_millis(100));

        // Not visible before the timer fires.
        let early = tokio::time::timeout(Duration::from_millis(20), queue.dequeue()).await;
        assert!(early.is_err());

        let late = tokio::time::timeout(Duration::from_millis(500), queue.dequeue())
            .await
            .expect("attempt should become visible after the delay");
        assert_eq!(late.unwrap().event_type, "retried");
    }

    #[tokio::test]
    async fn delayed_attempt_lands_behind_ready_work() {
        let queue = DispatchQueue::new();
        queue.schedule_retry(attempt("slow"), Duration::from_millis(50));
        queue.enqueue(attempt("fast"));

        assert_eq!(queue.dequeue().await.unwrap().event_type, "fast");
        let next = tokio::time::timeout(Duration::from_millis(500), queue.dequeue())
            .await
            .unwrap();
        assert_eq!(next.unwrap().event_type, "slow");
    }
}
