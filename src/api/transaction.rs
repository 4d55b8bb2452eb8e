use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{error, info};

use super::{error_response, ApiError};
use crate::{
    kadena::{validate, Operation, ParameterSet},
    AppState,
};

fn validated(state: &AppState, operation: &str, body: Value) -> Result<(Operation, ParameterSet), ApiError> {
    let invalid = |message: String| error_response(StatusCode::BAD_REQUEST, message);

    let params = ParameterSet::try_from(body).map_err(|e| invalid(e.to_string()))?;
    let params = validate(&state.registry, &state.config.chain_id_policy, operation, params)
        .map_err(|e| {
            info!(%operation, error = %e, "Rejected transaction parameters");
            invalid(e.to_string())
        })?;
    let op = Operation::from_name(operation)
        .ok_or_else(|| invalid(format!("Invalid endpoint '{}'", operation)))?;
    Ok((op, params))
}

/// POST /validate/*operation: returns the parameters unchanged, or 400.
pub async fn validate_handler(
    Path(operation): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ParameterSet>, ApiError> {
    let (_, params) = validated(&state, &operation, body)?;
    Ok(Json(params))
}

/// POST /transaction/*operation: validates, then asks the transaction API
/// for the unsigned transaction.
pub async fn transaction_handler(
    Path(operation): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let (op, params) = validated(&state, &operation, body)?;

    match state.transactions.generate(op, &params).await {
        Ok(tx) => Ok(Json(tx)),
        Err(e) => {
            error!("Failed to generate {} transaction: {:?}", op, e);
            Err(error_response(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
