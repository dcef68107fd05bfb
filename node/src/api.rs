//! # REST + JSON-RPC API
//!
//! Builds the axum router that exposes the ledger over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path             | Description                        |
//! |--------|------------------|------------------------------------|
//! | GET    | `/health`        | Liveness probe                     |
//! | GET    | `/status`        | Ledger status summary              |
//! | POST   | `/rpc`           | JSON-RPC 2.0 gateway               |
//! | GET    | `/accounts/:id`  | Unspent tokens held by an account  |
//! | GET    | `/metadata`      | Ledger name, symbol and version    |
//!
//! ## JSON-RPC methods
//!
//! | Method              | Params                             |
//! |---------------------|------------------------------------|
//! | `ctoken_invoke`     | `{sender, tx_hash?, input}`        |
//! | `ctoken_getAccount` | `[id]` or `{id}`                   |
//! | `ctoken_metadata`   | none                               |
//! | `ctoken_maxId`      | none                               |
//! | `ctoken_version`    | none                               |
//!
//! Invocations run one at a time behind a single async mutex, so each
//! executes against a consistent view of the ledger.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ctoken_protocol::crypto::derive_tx_hash;
use ctoken_protocol::ledger::Verdicts;
use ctoken_protocol::{
    DigestOracle, InvocationContext, Ledger, LedgerError, LedgerMetadata, Outcome, Request, Token,
};

use crate::metrics::SharedMetrics;

/// The ledger type served by the node.
pub type NodeLedger = Ledger<DigestOracle>;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger. Held for the whole of every invocation.
    pub ledger: Arc<Mutex<NodeLedger>>,
    /// Per-process counter mixed into derived transaction hashes.
    pub sequence: Arc<AtomicU64>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// When this process started serving.
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(version: String, ledger: NodeLedger, metrics: SharedMetrics) -> Self {
        Self {
            version,
            ledger: Arc::new(Mutex::new(ledger)),
            sequence: Arc::new(AtomicU64::new(0)),
            metrics,
            started_at: chrono::Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/rpc", post(rpc_handler))
        .route("/accounts/:id", get(account_handler))
        .route("/metadata", get(metadata_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters (positional or named).
    pub params: Option<serde_json::Value>,
    /// Request identifier. Echoed back in the response.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&LedgerError> for JsonRpcError {
    fn from(e: &LedgerError) -> Self {
        let mut data = serde_json::json!({ "kind": e.kind() });
        if let LedgerError::TokenNotFound { id } = e {
            data["id"] = serde_json::json!(id);
        }
        Self {
            code: e.rpc_code(),
            message: e.to_string(),
            data: Some(data),
        }
    }
}

/// Code returned when a queried account or the ledger metadata is absent.
pub const RPC_NOT_FOUND: i32 = -32001;

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Params of `ctoken_invoke`.
#[derive(Debug, Deserialize)]
pub struct InvokeParams {
    pub sender: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// The `{method, params}` ledger request.
    pub input: serde_json::Value,
}

/// Result of `ctoken_invoke`.
#[derive(Debug, Serialize)]
pub struct InvokeResult {
    pub tx_hash: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Whether the ledger has been issued.
    pub issued: bool,
    /// Token symbol, once issued.
    pub symbol: Option<String>,
    /// Last assigned token id.
    pub max_id: String,
    /// Number of accounts ever written.
    pub accounts: usize,
    /// Most recent diagnostic verdicts.
    pub verdicts: Verdicts,
    /// ISO-8601 time the node started serving.
    pub started_at: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /accounts/:id` and `ctoken_getAccount`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account: String,
    /// Unspent tokens in ascending id order.
    pub tokens: Vec<Token>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Ledger Access
// ---------------------------------------------------------------------------

/// Run one ledger request, recording metrics.
///
/// Derives a transaction hash from the sender, the request and a
/// per-process sequence number when the caller did not supply one.
pub async fn invoke(
    state: &AppState,
    sender: String,
    tx_hash: Option<String>,
    input: serde_json::Value,
) -> Result<InvokeResult, LedgerError> {
    let timer = state.metrics.invocation_latency_seconds.start_timer();

    let request = match Request::from_value(input) {
        Ok(request) => request,
        Err(e) => {
            state.metrics.invocations_total.with_label_values(&["invalid"]).inc();
            state.metrics.aborts_total.with_label_values(&[e.kind()]).inc();
            return Err(e);
        }
    };
    state
        .metrics
        .invocations_total
        .with_label_values(&[request.method()])
        .inc();

    let tx_hash = tx_hash.unwrap_or_else(|| {
        let sequence = state.sequence.fetch_add(1, Ordering::Relaxed);
        let bytes = request.to_value().to_string();
        derive_tx_hash(&sender, bytes.as_bytes(), sequence)
    });
    let ctx = InvocationContext::new(sender, tx_hash);

    // sled reads, writes and the commit flush block, so the ledger runs on
    // the blocking pool while this invocation holds the lock.
    let ledger = Arc::clone(&state.ledger).lock_owned().await;
    let joined = tokio::task::spawn_blocking(move || {
        let result = ledger.dispatch(&ctx, &request);
        let max_id = ledger.max_id();
        (ctx, result, max_id)
    })
    .await;
    let (ctx, result, max_id) = match joined {
        Ok(done) => done,
        // Blocking tasks are only cancelled at runtime shutdown.
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    };
    timer.observe_duration();

    match result {
        Ok(outcome) => {
            state.metrics.tokens_minted_total.inc_by(outcome.minted() as u64);
            if let Ok(max_id) = max_id {
                state.metrics.set_max_token_id(max_id);
            }
            Ok(InvokeResult {
                tx_hash: ctx.tx_hash,
                outcome,
            })
        }
        Err(e) => {
            state.metrics.aborts_total.with_label_values(&[e.kind()]).inc();
            Err(e)
        }
    }
}

async fn load_account(state: &AppState, id: &str) -> Result<Option<AccountResponse>, LedgerError> {
    let account = state.ledger.lock().await.account(id)?;
    Ok(account.map(|account| AccountResponse {
        account: id.to_string(),
        tokens: account.tokens().cloned().collect(),
    }))
}

async fn load_metadata(state: &AppState) -> Result<Option<LedgerMetadata>, LedgerError> {
    state.ledger.lock().await.metadata()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: returns a ledger summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    match load_status(&state).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => internal_error(&e),
    }
}

async fn load_status(state: &AppState) -> Result<StatusResponse, LedgerError> {
    let ledger = state.ledger.lock().await;
    let metadata = ledger.metadata()?;
    Ok(StatusResponse {
        version: state.version.clone(),
        issued: metadata.is_some(),
        symbol: metadata.map(|m| m.symbol),
        max_id: ledger.max_id()?.to_string(),
        accounts: ledger.db().account_count(),
        verdicts: ledger.last_verdicts()?,
        started_at: state.started_at.to_rfc3339(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /accounts/:id`: unspent tokens of an account.
async fn account_handler(Path(id): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    match load_account(&state, &id).await {
        Ok(Some(account)) => Json(account).into_response(),
        Ok(None) => not_found(format!("account not found: {id}")),
        Err(e) => internal_error(&e),
    }
}

/// `GET /metadata`: ledger metadata, 404 before issuance.
async fn metadata_handler(State(state): State<AppState>) -> impl IntoResponse {
    match load_metadata(&state).await {
        Ok(Some(metadata)) => Json(metadata).into_response(),
        Ok(None) => not_found("ledger not issued".to_string()),
        Err(e) => internal_error(&e),
    }
}

fn not_found(error: String) -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error })).into_response()
}

fn internal_error(e: &LedgerError) -> axum::response::Response {
    tracing::error!(error = %e, "ledger read failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
///
/// Ledger rejections come back as JSON-RPC errors whose code identifies the
/// failed check and whose `data.kind` names it.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError::new(
                -32600,
                "Invalid Request: jsonrpc must be \"2.0\"",
            )),
            id: req.id,
        });
    }

    let outcome = dispatch_rpc(&state, &req.method, req.params).await;
    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(error) => (None, Some(error)),
    };

    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

async fn dispatch_rpc(
    state: &AppState,
    method: &str,
    params: Option<serde_json::Value>,
) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        "ctoken_invoke" => {
            let params: InvokeParams = params
                .ok_or_else(|| JsonRpcError::new(-32602, "Invalid params: expected {sender, input}"))
                .and_then(|p| {
                    serde_json::from_value(p)
                        .map_err(|e| JsonRpcError::new(-32602, format!("Invalid params: {e}")))
                })?;
            let result = invoke(state, params.sender, params.tx_hash, params.input)
                .await
                .map_err(|e| JsonRpcError::from(&e))?;
            to_json(&result)
        }
        "ctoken_getAccount" => {
            let id = params
                .as_ref()
                .and_then(|p| match p {
                    serde_json::Value::Array(arr) => arr.first(),
                    other => other.get("id"),
                })
                .and_then(|v| v.as_str())
                .ok_or_else(|| JsonRpcError::new(-32602, "Invalid params: expected [id]"))?;
            match load_account(state, id).await {
                Ok(Some(account)) => to_json(&account),
                Ok(None) => Err(JsonRpcError::new(
                    RPC_NOT_FOUND,
                    format!("Account not found: {id}"),
                )),
                Err(e) => Err(JsonRpcError::from(&e)),
            }
        }
        "ctoken_metadata" => {
            let metadata = load_metadata(state)
                .await
                .map_err(|e| JsonRpcError::from(&e))?;
            to_json(&metadata)
        }
        "ctoken_maxId" => {
            let max_id = state
                .ledger
                .lock()
                .await
                .max_id()
                .map_err(|e| JsonRpcError::from(&e))?;
            Ok(serde_json::json!(max_id.to_string()))
        }
        "ctoken_version" => Ok(serde_json::json!(state.version)),
        other => Err(JsonRpcError::new(
            -32601,
            format!("Method not found: {other}"),
        )),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(-32603, format!("Internal error: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
