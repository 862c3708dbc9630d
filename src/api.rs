//! HTTP transport for PeerChain
//!
//! Maps HTTP verbs onto [`Node`] operations. The same routes serve clients and
//! peers: other nodes fetch `/chain` and `/nodes`, forward `/transactions`,
//! announce themselves on `/nodes` and trigger `/nodes/resolve`.

use axum::{
    extract::{Request, State},
    http::{self, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use crate::network::{
    ChainResponse, IndexResponse, OkResponse, CHAIN_PATH, NODES_PATH, ORIGIN_HEADER, RESOLVE_PATH,
    TRANSACTIONS_PATH,
};
use crate::node::{Node, NodeState};
use crate::transaction::{Transaction, TransactionRequest};

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidTransaction(_) => ApiError::InvalidInput(err.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    node_state: NodeState,
    chain_length: usize,
    peers: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![
            http::header::CONTENT_TYPE,
            http::HeaderName::from_static(ORIGIN_HEADER),
        ])
        .allow_credentials(true);

    Router::new()
        .route(
            TRANSACTIONS_PATH,
            get(list_transactions).post(submit_transaction),
        )
        .route("/mine", get(mine_block))
        .route(CHAIN_PATH, get(get_chain))
        .route(NODES_PATH, get(list_nodes).post(register_nodes))
        .route(RESOLVE_PATH, get(resolve_conflicts))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serves the API on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, node: Arc<Node>) -> Result<()> {
    let app = build_api_router(node);
    axum::serve(listener, app)
        .await
        .map_err(|e| ChainError::NetworkError(format!("API server error: {}", e)))
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn submit_transaction(
    State(node): State<Arc<Node>>,
    headers: HeaderMap,
    Json(req): Json<TransactionRequest>,
) -> std::result::Result<Json<IndexResponse>, ApiError> {
    let origin = headers
        .get(ORIGIN_HEADER)
        .and_then(|value| value.to_str().ok());

    let index = node.submit_transaction(req, origin).await?;
    Ok(Json(IndexResponse { index }))
}

async fn list_transactions(State(node): State<Arc<Node>>) -> Json<Vec<Transaction>> {
    Json(node.pending_transactions().await)
}

async fn mine_block(State(node): State<Arc<Node>>) -> std::result::Result<Json<Block>, ApiError> {
    Ok(Json(node.mine_block().await?))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let chain = node.chain().await;
    let length = chain.len();
    Json(ChainResponse { chain, length })
}

async fn register_nodes(
    State(node): State<Arc<Node>>,
    Json(addresses): Json<Vec<String>>,
) -> Json<OkResponse> {
    node.register_peers(&addresses);
    Json(OkResponse { ok: 1 })
}

async fn list_nodes(State(node): State<Arc<Node>>) -> Json<Vec<String>> {
    Json(node.peers())
}

async fn resolve_conflicts(State(node): State<Arc<Node>>) -> Json<OkResponse> {
    Json(OkResponse::from_bool(node.resolve().await))
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let node_state = node.state().await;
    let status = if node_state == NodeState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "healthy" } else { "unhealthy" },
            node_state,
            chain_length: node.chain_len().await,
            peers: node.peers().len(),
        }),
    )
}
