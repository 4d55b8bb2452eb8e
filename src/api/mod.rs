//! # API Module
//!
//! HTTP handlers for the Kadena agent server.
//!
//! ## Available Endpoints
//!
//! ### Agents
//! - `POST /query` - Ask K-Agent a question or request a transaction
//! - `POST /prompt` - Rate a trading agent prompt and list open questions
//! - `POST /code` - Generate trading agent code and its schedule
//!
//! ### Transactions
//! - `POST /validate/*operation` - Validate parameters without calling the API
//! - `POST /transaction/*operation` - Validate, then generate an unsigned transaction
//!
//! ### Service
//! - `GET /health` - Liveness check
//! - `POST /rpc` - JSON-RPC tool calls (same handler as the stdin MCP mode)

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use validator::ValidationErrors;

use crate::AppState;

pub mod health;
pub mod query;
pub mod rpc;
pub mod trader;
pub mod transaction;

/// Error half of every handler result: a status plus `{"error": ...}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

pub(crate) fn invalid_body(errors: ValidationErrors) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, format!("Invalid request: {}", errors))
}

/// Routes served over HTTP, without the state or middleware layers.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/query", post(query::query_handler))
        .route("/prompt", post(trader::prompt_handler))
        .route("/code", post(trader::code_handler))
        .route("/validate/*operation", post(transaction::validate_handler))
        .route("/transaction/*operation", post(transaction::transaction_handler))
        .route("/rpc", post(rpc::rpc_handler))
}
