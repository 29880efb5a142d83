//! Shared fixtures: in-process HTTP sinks that stand in for webhook
//! destinations and capture what the dispatcher sends them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::time::Instant;

/// How the sink answers successive requests.
#[derive(Debug, Clone, Copy)]
pub enum ResponsePlan {
    /// Same status for every request.
    Always(u16),
    /// `failures` requests answered with `fail_status`, then 200 forever.
    FailThen { failures: usize, fail_status: u16 },
}

/// One request as seen by the destination.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub received_at: Instant,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("sink received non-JSON body")
    }
}

#[derive(Clone)]
struct SinkState {
    plan: ResponsePlan,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// A destination endpoint bound on a random localhost port.
pub struct Sink {
    pub url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Sink {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Poll until the sink has seen at least `n` requests.
    pub async fn wait_for_hits(&self, n: usize, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.hits() < n {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {n} hits, saw {}",
                self.hits()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Bind a sink on 127.0.0.1:0 and serve it from a background task.
pub async fn start_sink(plan: ResponsePlan) -> Sink {
    let state = SinkState {
        plan,
        hits: Arc::new(AtomicUsize::new(0)),
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/hook", post(handle))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind sink");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Sink {
        url: format!("http://127.0.0.1:{port}/hook"),
        hits: state.hits,
        requests: state.requests,
    }
}

async fn handle(State(state): State<SinkState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|s| (k.as_str().to_ascii_lowercase(), s.to_string()))
        })
        .collect();

    state.requests.lock().unwrap().push(CapturedRequest {
        headers: header_map,
        body: body.to_vec(),
        received_at: Instant::now(),
    });
    let n = state.hits.fetch_add(1, Ordering::SeqCst);

    let status = match state.plan {
        ResponsePlan::Always(code) => code,
        ResponsePlan::FailThen {
            failures,
            fail_status,
        } => {
            if n < failures {
                fail_status
            } else {
                200
            }
        }
    };
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
