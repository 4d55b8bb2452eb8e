//! HTTP clients for the downstream Kadena services.
//!
//! `TransactionClient` posts validated parameters to the transaction API,
//! which answers with unsigned transaction data. `AnalysisClient` forwards
//! informational questions to the question-answering service.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{Operation, ParameterSet};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Server Error: {0}")]
    Server(String),
    #[error("API Error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// The `{"error": ...}` object surfaced to callers.
    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Client for the unsigned-transaction generation API.
#[derive(Clone)]
pub struct TransactionClient {
    http: Client,
    base_url: String,
    api_key: Arc<SecretString>,
}

impl TransactionClient {
    pub fn new(http: Client, base_url: &str, api_key: Arc<SecretString>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// POSTs the parameters to `{base_url}/{operation}`. One attempt, no retry.
    pub async fn generate(
        &self,
        operation: Operation,
        params: &ParameterSet,
    ) -> Result<Value, ClientError> {
        let url = format!("{}/{}", self.base_url, operation.as_str());
        info!(%operation, "Requesting unsigned transaction");

        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", self.api_key.expose_secret().as_str())
            .json(params)
            .send()
            .await?;

        let status = resp.status();
        debug!(status = %status, %operation, "Transaction API response status");
        read_json_response(resp).await
    }
}

/// Client for the question-answering service.
#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    url: String,
}

impl AnalysisClient {
    pub fn new(http: Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }

    pub async fn analyze(&self, query: &str, system_prompt: &str) -> Result<Value, ClientError> {
        info!("Forwarding query to analysis service");
        let resp = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&json!({
                "query": query,
                "systemPrompt": system_prompt,
            }))
            .send()
            .await?;
        read_json_response(resp).await
    }
}

/// Maps a downstream response onto `ClientError`, surfacing the body's
/// `error` field for 400 and 500 answers.
async fn read_json_response(resp: reqwest::Response) -> Result<Value, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<Value>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("error").map(error_text))
        .unwrap_or_else(|| "Unknown error".to_string());
    warn!(status = %status, error = %message, "Downstream API returned an error");

    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::BadRequest(message),
        StatusCode::INTERNAL_SERVER_ERROR => ClientError::Server(message),
        other => ClientError::Api {
            status: other.as_u16(),
            message: if message == "Unknown error" && !text.is_empty() {
                text
            } else {
                message
            },
        },
    })
}

fn error_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};

    fn transaction_client() -> TransactionClient {
        TransactionClient::new(
            Client::new(),
            &format!("{}/", mockito::server_url()),
            Arc::new(SecretString::new("test-key".to_string())),
        )
    }

    fn quote_params() -> ParameterSet {
        ParameterSet::try_from(json!({
            "tokenInAddress": "coin",
            "tokenOutAddress": "kaddex.kdx",
            "amountIn": "10",
            "chainId": "2"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn posts_parameters_with_api_key() {
        let _m = mock("POST", "/quote")
            .match_header("x-api-key", "test-key")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({ "tokenInAddress": "coin", "amountIn": "10" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"amountOut":"42.1","priceImpact":"0.01"}"#)
            .create();

        let out = transaction_client()
            .generate(Operation::Quote, &quote_params())
            .await
            .unwrap();
        assert_eq!(out["amountOut"], "42.1");
    }

    #[tokio::test]
    async fn surfaces_bad_request_error_field() {
        let _m = mock("POST", "/nft/collection")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Collection already exists"}"#)
            .create();

        let err = transaction_client()
            .generate(Operation::CreateCollection, &ParameterSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::BadRequest(_)));
        assert_eq!(err.to_string(), "Bad Request: Collection already exists");
    }

    #[tokio::test]
    async fn server_error_without_body_is_unknown() {
        let _m = mock("POST", "/nft/launch")
            .with_status(500)
            .with_body("")
            .create();

        let err = transaction_client()
            .generate(Operation::LaunchNft, &ParameterSet::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Server Error: Unknown error");
    }

    #[tokio::test]
    async fn analysis_client_sends_query_and_system_prompt() {
        let _m = mock("POST", "/analyze")
            .match_body(Matcher::Json(json!({
                "query": "What is Kadena?",
                "systemPrompt": "You are K-Agent"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"rawData":"Kadena is a PoW chain"}}"#)
            .create();

        let client = AnalysisClient::new(Client::new(), &format!("{}/analyze", mockito::server_url()));
        let out = client.analyze("What is Kadena?", "You are K-Agent").await.unwrap();
        assert_eq!(out["data"]["rawData"], "Kadena is a PoW chain");
    }
}
