use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;

use super::{error_response, invalid_body, ApiError};
use crate::{
    agent::kagent::{run_query, QueryResponse},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    /// The user's query about the Kadena blockchain
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    /// Lines returned by the previous call, oldest first
    #[serde(default)]
    pub history: Option<Vec<String>>,
}

pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    request.validate().map_err(invalid_body)?;
    info!(
        "Received query ({} chars) with {} history lines",
        request.query.len(),
        request.history.as_ref().map_or(0, Vec::len)
    );

    match run_query(&state, &request.query, request.history.unwrap_or_default()).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Failed to process query: {:?}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing query: {:#}", e),
            ))
        }
    }
}
