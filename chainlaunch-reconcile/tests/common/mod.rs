//! Mock Chainlaunch API for integration tests.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use chainlaunch_reconcile::{Auth, ClientConfig, Engine, HttpTransport};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const API_PREFIX: &str = "/api/v1";

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockState {
    routes: Mutex<HashMap<(String, String), VecDeque<(StatusCode, Option<Value>)>>>,
    requests: Mutex<Vec<Recorded>>,
}

/// Serves scripted replies per (method, path). The last reply for a route
/// repeats; unscripted routes answer 404.
pub struct MockServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Queue a reply for `method path`. `body` of `None` sends an empty body.
    pub fn reply(&self, method: &str, path: &str, status: u16, body: Option<Value>) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((StatusCode::from_u16(status).unwrap(), body));
        self
    }

    pub fn ok(&self, method: &str, path: &str, body: Value) -> &Self {
        self.reply(method, path, 200, Some(body))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url()).expect("valid base URL")
    }

    /// Engine over a real HTTP transport pointed at this server.
    pub fn engine(&self, auth: Auth) -> Engine {
        let transport = HttpTransport::new(self.config().with_auth(auth)).expect("HTTP client");
        Engine::new(Arc::new(transport))
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        body: serde_json::from_slice(&body).ok(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let reply = {
        let mut routes = state.routes.lock().unwrap();
        routes
            .get_mut(&(method.to_string(), path.clone()))
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
    };

    let (status, body) = reply.unwrap_or((
        StatusCode::NOT_FOUND,
        Some(json!({"message": format!("{} not found", path)})),
    ));
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}
