use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;

use super::{error_response, invalid_body, ApiError};
use crate::{
    agent::trader::{generate_code, improve_prompt, CodeResponse, PromptResponse},
    AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct TraderRequest {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<String>,
}

// First 100 characters, for log lines.
fn preview(prompt: &str) -> String {
    prompt.chars().take(100).collect()
}

/// POST /prompt: evaluate and improve a trading agent prompt.
pub async fn prompt_handler(
    State(state): State<AppState>,
    Json(request): Json<TraderRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    request.validate().map_err(invalid_body)?;
    info!("Processing prompt request: {}...", preview(&request.prompt));

    match improve_prompt(&state, &request.prompt, request.history).await {
        Ok(response) => {
            info!(rating = response.response.rating, "Prompt processing completed");
            Ok(Json(response))
        }
        Err(e) => {
            error!("Error processing prompt: {:?}", e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)))
        }
    }
}

/// POST /code: generate code for a trading agent.
pub async fn code_handler(
    State(state): State<AppState>,
    Json(request): Json<TraderRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    request.validate().map_err(invalid_body)?;
    info!("Generating code for prompt: {}...", preview(&request.prompt));

    match generate_code(&state, &request.prompt).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Error generating code: {:?}", e);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)))
        }
    }
}
