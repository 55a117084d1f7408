//! Health Check Server - Liveness, Readiness, Status, Metrics and Control
//!
//! Exposes /live, /ready, /status and /metrics via axum 0.7, plus
//! POST /start and /stop to drive the engine. Readiness follows the
//! engine lifecycle: 200 only while the loop is running.
//!
//! With an account store attached, POST /accounts imports a wallet
//! secret and GET /accounts lists kinds and addresses. Secrets are
//! never part of a response or a log line.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use super::prometheus::MetricsRegistry;
use crate::domain::error::EngineError;
use crate::ports::account_store::{AccountKind, AccountStore, StoredAccount};
use crate::ports::status::AutomationControl;
use crate::usecases::signing_session::{import_account, list_accounts};

/// State shared by all handlers.
#[derive(Clone)]
struct HealthState {
    engine: Arc<dyn AutomationControl>,
    metrics: Option<Arc<MetricsRegistry>>,
    accounts: Option<Arc<dyn AccountStore>>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    state: HealthState,
    bind_address: String,
}

impl HealthServer {
    /// Create a new health server. Without a registry `/metrics` is 404.
    pub fn new(
        engine: Arc<dyn AutomationControl>,
        metrics: Option<Arc<MetricsRegistry>>,
        bind_address: impl Into<String>,
    ) -> Self {
        Self {
            state: HealthState {
                engine,
                metrics,
                accounts: None,
            },
            bind_address: bind_address.into(),
        }
    }

    /// Enable `/accounts`. Without a store the route answers 404.
    #[must_use]
    pub fn with_accounts(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.state.accounts = Some(store);
        self
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.bind_address))]
    pub async fn run(self, shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await?;
        self.serve(listener, shutdown_rx).await
    }

    /// Serve on an already-bound listener until shutdown.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(liveness))
            .route("/ready", get(readiness))
            .route("/status", get(status))
            .route("/metrics", get(metrics))
            .route("/start", post(start))
            .route("/stop", post(stop))
            .route("/accounts", get(accounts).post(save_account))
            .with_state(self.state);

        info!(address = %listener.local_addr()?, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

/// Liveness: always 200 while the process is up.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness: 200 only while the engine is running.
async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
    if state.engine.status().is_running() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn status(State(state): State<HealthState>) -> impl IntoResponse {
    Json(state.engine.status())
}

/// 200 when started, 409 when already running, 422 on invalid settings.
async fn start(State(state): State<HealthState>) -> impl IntoResponse {
    match state.engine.start() {
        Ok(()) => (StatusCode::OK, "STARTED".to_string()),
        Err(EngineError::AlreadyRunning) => (StatusCode::CONFLICT, "ALREADY RUNNING".to_string()),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

async fn stop(State(state): State<HealthState>) -> impl IntoResponse {
    state.engine.stop();
    (StatusCode::OK, "STOPPED")
}

/// Body of POST /accounts. No `Debug`: it carries the secret.
#[derive(Deserialize)]
struct ImportRequest {
    #[serde(rename = "type")]
    kind: AccountKind,
    input: String,
}

fn accounts_disabled() -> Response {
    (StatusCode::NOT_FOUND, "accounts disabled").into_response()
}

async fn accounts(State(state): State<HealthState>) -> Response {
    let Some(store) = state.accounts else {
        return accounts_disabled();
    };
    match list_accounts(store.as_ref()).await {
        Ok(listed) => Json(listed).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list accounts");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 200 with the address, 400 on an unreadable body, 422 on a rejected
/// secret, 500 when the store fails.
async fn save_account(
    State(state): State<HealthState>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> Response {
    let Some(store) = state.accounts else {
        return accounts_disabled();
    };
    // The rejection text may quote the body, so it is not forwarded.
    let Ok(Json(request)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "expected {\"type\", \"input\"}"})),
        )
            .into_response();
    };

    let account = StoredAccount {
        kind: request.kind,
        secret: request.input,
    };
    match import_account(store.as_ref(), &account).await {
        Ok(address) => Json(json!({
            "success": true,
            "address": address.map(|a| a.to_string()),
        }))
        .into_response(),
        Err(e) => {
            let status = if e.is_invalid_input() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            warn!(kind = %account.kind, error = %e, "Account import rejected");
            (status, Json(json!({"success": false, "error": e.to_string()}))).into_response()
        }
    }
}

async fn metrics(State(state): State<HealthState>) -> Response {
    let Some(registry) = state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
    };
    registry.sync_status(&state.engine.status());
    match registry.encode() {
        Ok(body) => body.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::adapters::persistence::FileAccountStore;
    use crate::domain::network::Network;
    use crate::domain::status::{EngineCounters, EngineState, EngineStatus};
    use crate::ports::status::StatusSource;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    struct FixedStatus(Mutex<EngineState>);

    impl AutomationControl for FixedStatus {
        fn start(&self) -> Result<(), EngineError> {
            let mut state = self.0.lock().unwrap();
            if *state == EngineState::Running {
                return Err(EngineError::AlreadyRunning);
            }
            *state = EngineState::Running;
            Ok(())
        }

        fn stop(&self) {
            *self.0.lock().unwrap() = EngineState::Stopped;
        }
    }

    impl StatusSource for FixedStatus {
        fn status(&self) -> EngineStatus {
            EngineStatus {
                state: *self.0.lock().unwrap(),
                enabled_networks: vec![Network::Ethereum],
                counters: EngineCounters {
                    offers: 4,
                    ..EngineCounters::default()
                },
            }
        }
    }

    async fn spawn_server(
        source: Arc<FixedStatus>,
    ) -> (String, broadcast::Sender<()>, tokio::task::JoinHandle<()>) {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        serve_in_background(HealthServer::new(source, Some(metrics), "unused")).await
    }

    async fn serve_in_background(
        server: HealthServer,
    ) -> (String, broadcast::Sender<()>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move {
            server.serve(listener, rx).await.unwrap();
        });
        (base, tx, handle)
    }

    #[tokio::test]
    async fn test_ready_follows_engine_state() {
        let source = Arc::new(FixedStatus(Mutex::new(EngineState::Stopped)));
        let (base, shutdown, handle) = spawn_server(Arc::clone(&source)).await;

        let live = reqwest::get(format!("{base}/live")).await.unwrap();
        assert_eq!(live.status(), 200);

        let ready = reqwest::get(format!("{base}/ready")).await.unwrap();
        assert_eq!(ready.status(), 503);

        let client = reqwest::Client::new();
        let started = client.post(format!("{base}/start")).send().await.unwrap();
        assert_eq!(started.status(), 200);
        let again = client.post(format!("{base}/start")).send().await.unwrap();
        assert_eq!(again.status(), 409);

        let ready = reqwest::get(format!("{base}/ready")).await.unwrap();
        assert_eq!(ready.status(), 200);

        let stopped = client.post(format!("{base}/stop")).send().await.unwrap();
        assert_eq!(stopped.status(), 200);
        assert_eq!(*source.0.lock().unwrap(), EngineState::Stopped);
        drop(client);

        shutdown.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_status_and_metrics_bodies() {
        let source = Arc::new(FixedStatus(Mutex::new(EngineState::Running)));
        let (base, shutdown, handle) = spawn_server(source).await;

        let body: serde_json::Value = reqwest::get(format!("{base}/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["state"], "running");
        assert_eq!(body["enabled_networks"][0], "ethereum");
        assert_eq!(body["counters"]["offers"], 4);

        let text = reqwest::get(format!("{base}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("nft_bot_offers_total 4"));
        assert!(text.contains("nft_bot_engine_running 1"));

        shutdown.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_accounts_import_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileAccountStore::new(dir.path().join("accounts.txt")));
        let source = Arc::new(FixedStatus(Mutex::new(EngineState::Stopped)));
        let server = HealthServer::new(source, None, "unused").with_accounts(Arc::clone(&store) as _);
        let (base, shutdown, handle) = serve_in_background(server).await;
        let client = reqwest::Client::new();
        let url = format!("{base}/accounts");

        let saved = client
            .post(&url)
            .json(&json!({"type": "privateKey", "input": KEY}))
            .send()
            .await
            .unwrap();
        assert_eq!(saved.status(), 200);
        let body: serde_json::Value = saved.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["address"], ADDRESS);

        let malformed = client
            .post(&url)
            .json(&json!({"type": "privateKey", "input": "0xdeadbeefnothex"}))
            .send()
            .await
            .unwrap();
        assert_eq!(malformed.status(), 422);
        assert!(!malformed.text().await.unwrap().contains("deadbeef"));

        let short_phrase = client
            .post(&url)
            .json(&json!({"type": "seedPhrase", "input": "only three words"}))
            .send()
            .await
            .unwrap();
        assert_eq!(short_phrase.status(), 422);

        let missing_input = client
            .post(&url)
            .json(&json!({"type": "privateKey"}))
            .send()
            .await
            .unwrap();
        assert_eq!(missing_input.status(), 400);

        let listed = client.get(&url).send().await.unwrap();
        assert_eq!(listed.status(), 200);
        let text = listed.text().await.unwrap();
        assert!(!text.contains(&KEY[2..]));
        let listed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(listed, json!([{"type": "privateKey", "address": ADDRESS}]));
        assert_eq!(store.restore().await.unwrap().len(), 1);
        drop(client);

        shutdown.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_accounts_404_without_store() {
        let source = Arc::new(FixedStatus(Mutex::new(EngineState::Stopped)));
        let (base, shutdown, handle) = spawn_server(source).await;
        let client = reqwest::Client::new();

        let listed = client.get(format!("{base}/accounts")).send().await.unwrap();
        assert_eq!(listed.status(), 404);
        let saved = client
            .post(format!("{base}/accounts"))
            .json(&json!({"type": "privateKey", "input": KEY}))
            .send()
            .await
            .unwrap();
        assert_eq!(saved.status(), 404);
        drop(client);

        shutdown.send(()).unwrap();
        handle.await.unwrap();
    }
}
