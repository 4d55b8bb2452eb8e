//! K-Agent: natural-language queries about Kadena, answered directly or
//! through the transaction and analysis tools.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    agent::{
        history::History,
        llm::{AgentDecision, ChatMessage, ToolSpec},
        prompts,
    },
    kadena::{validate, Operation, ParameterSet},
    AppState,
};

pub const TRANSACTION_TOOL: &str = "kadena_transaction";
pub const ANALYSIS_TOOL: &str = "kadena_analysis";

/// Token address fields checked against the blacklist before a transaction
/// request leaves the service.
const TOKEN_FIELDS: [&str; 3] = ["tokenAddress", "tokenInAddress", "tokenOutAddress"];

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub response: Value,
    pub intermediate_steps: Vec<Value>,
    pub history: Vec<String>,
}

/// Tool definitions offered to the model.
pub fn tool_specs() -> Vec<ToolSpec> {
    let endpoints: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
    vec![
        ToolSpec {
            name: TRANSACTION_TOOL,
            description: "Generate unsigned transactions for Kadena blockchain operations: quotes, \
                token transfers, token swaps, NFT minting (nft/launch) and collection creation \
                (nft/collection). Pass the endpoint plus every parameter from the transaction \
                documentation as top-level properties.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "endpoint": { "type": "string", "enum": endpoints },
                    "tokenAddress": { "type": "string" },
                    "tokenInAddress": { "type": "string" },
                    "tokenOutAddress": { "type": "string" },
                    "sender": { "type": "string" },
                    "receiver": { "type": "string" },
                    "account": { "type": "string" },
                    "amount": { "type": "string" },
                    "amountIn": { "type": "string" },
                    "amountOut": { "type": "string" },
                    "slippage": { "type": "string" },
                    "chainId": { "type": "string" },
                    "guard": { "type": "object" },
                    "mintTo": { "type": "string" },
                    "uri": { "type": "string" },
                    "collectionId": { "type": "string" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "totalSupply": { "type": "string" }
                },
                "required": ["endpoint"],
                "additionalProperties": true
            }),
        },
        ToolSpec {
            name: ANALYSIS_TOOL,
            description: "Answer questions about the Kadena blockchain that cannot be answered \
                from the available context.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The user's question plus any useful context" },
                    "systemPrompt": { "type": "string", "description": "Character description of K-Agent" }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Runs one query through the agent and returns the answer with the
/// updated history.
pub async fn run_query(state: &AppState, query: &str, history: Vec<String>) -> Result<QueryResponse> {
    let request_id = Uuid::new_v4();
    let history = History::from_lines(history, state.config.max_history_length);
    info!(%request_id, history_len = history.len(), "Running K-Agent query");

    let system = prompts::k_agent_system(
        &history.format(),
        &state.registry.api_docs(&state.config.chain_id_policy),
        state.registry.tokens_text(),
    );
    let messages = [ChatMessage::system(system), ChatMessage::user(query)];

    let decision = state
        .llm
        .complete_with_tools(&state.config.model_name, &messages, &tool_specs())
        .await
        .context("Agent model call failed")?;

    let mut intermediate_steps = Vec::new();
    let response = match decision {
        AgentDecision::Finish(text) => Value::String(text),
        AgentDecision::ToolCall { name, arguments } => {
            info!(%request_id, tool = %name, "Dispatching tool call");
            let (output, response) = match name.as_str() {
                TRANSACTION_TOOL => run_transaction_tool(state, query, &arguments).await?,
                ANALYSIS_TOOL => run_analysis_tool(state, &arguments).await?,
                other => {
                    warn!(%request_id, tool = %other, "Model requested an unknown tool");
                    let output = json!({ "error": format!("Unknown tool: {}", other) });
                    (output.clone(), output)
                }
            };
            intermediate_steps.push(json!({
                "tool": name,
                "input": arguments,
                "output": output,
            }));
            response
        }
    };

    let history = history.append(query, &response_text(&response));
    Ok(QueryResponse {
        response,
        intermediate_steps,
        history: history.into_lines(),
    })
}

/// Validates and forwards a transaction request. Returns the raw tool output
/// and the response shown to the user.
pub async fn run_transaction_tool(
    state: &AppState,
    query: &str,
    arguments: &Value,
) -> Result<(Value, Value)> {
    let output = execute_transaction(state, arguments).await;

    if let Some(error) = output.get("error").and_then(Value::as_str) {
        let details = output
            .get("details")
            .map(response_text)
            .unwrap_or_else(|| "No additional details available".to_string());
        let explanation = state
            .llm
            .complete(
                &state.config.processing_model,
                &[
                    ChatMessage::system(prompts::TRANSACTION_ERROR_SYSTEM),
                    ChatMessage::user(prompts::transaction_error_details(error, &details, query)),
                ],
            )
            .await
            .context("Error explanation model call failed")?;
        return Ok((output, Value::String(explanation)));
    }

    let response = match arguments.get("endpoint").and_then(Value::as_str).and_then(Operation::from_name) {
        Some(Operation::Quote) => annotate_quote(arguments, output.clone()),
        _ => output.clone(),
    };
    Ok((output, response))
}

/// Blacklist check, validation, then one call to the transaction API.
/// Every failure is folded into an `{"error": ...}` object.
pub async fn execute_transaction(state: &AppState, arguments: &Value) -> Value {
    let Value::Object(args) = arguments else {
        return json!({ "error": "Tool arguments must be a JSON object" });
    };
    let mut body: Map<String, Value> = args.clone();
    let endpoint = match body.remove("endpoint") {
        Some(Value::String(endpoint)) => endpoint,
        _ => return json!({ "error": "Missing 'endpoint' in tool arguments" }),
    };

    for field in TOKEN_FIELDS {
        if let Some(address) = body.get(field).and_then(Value::as_str) {
            if state.registry.tokens().is_blacklisted(address) {
                return json!({ "error": format!("Token '{}' is blacklisted and cannot be traded", address) });
            }
        }
    }

    let params = match validate(
        &state.registry,
        &state.config.chain_id_policy,
        &endpoint,
        ParameterSet::new(body),
    ) {
        Ok(params) => params,
        Err(e) => {
            info!(%endpoint, error = %e, "Transaction parameters rejected");
            return e.to_json();
        }
    };
    // validate() has already resolved the name.
    let Some(operation) = Operation::from_name(&endpoint) else {
        return json!({ "error": format!("Unknown endpoint: {}", endpoint) });
    };

    match state.transactions.generate(operation, &params).await {
        Ok(tx) => tx,
        Err(e) => e.to_json(),
    }
}

fn annotate_quote(arguments: &Value, output: Value) -> Value {
    let token_out = arguments
        .get("tokenOutAddress")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let text = Value::String(format!("Quote in terms of {}", token_out));

    match output {
        Value::Object(mut map) => {
            map.insert("text".into(), text);
            Value::Object(map)
        }
        other => json!({ "data": other, "text": text }),
    }
}

async fn run_analysis_tool(state: &AppState, arguments: &Value) -> Result<(Value, Value)> {
    let query = arguments
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let system_prompt = arguments
        .get("systemPrompt")
        .and_then(Value::as_str)
        .unwrap_or(prompts::K_AGENT_CHARACTER);

    let output = match state.analysis.analyze(query, system_prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Analysis service failed");
            e.to_json()
        }
    };

    let processed = state
        .llm
        .complete(
            &state.config.processing_model,
            &[
                ChatMessage::system(prompts::ANALYSIS_PROCESSING_SYSTEM),
                ChatMessage::user(response_text(&output)),
            ],
        )
        .await
        .context("Analysis processing model call failed")?;
    Ok((output, Value::String(processed)))
}

/// Text form of a response for history lines and prompts.
fn response_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_tool_lists_every_endpoint() {
        let specs = tool_specs();
        let enums = &specs[0].parameters["properties"]["endpoint"]["enum"];
        assert_eq!(enums.as_array().unwrap().len(), Operation::ALL.len());
        assert_eq!(specs[1].name, ANALYSIS_TOOL);
    }

    #[test]
    fn quote_text_names_the_output_contract() {
        let args = json!({"endpoint": "quote", "tokenOutAddress": "kaddex.kdx"});
        let annotated = annotate_quote(&args, json!({"amountOut": "3.2"}));
        assert_eq!(annotated["text"], "Quote in terms of kaddex.kdx");
        assert_eq!(annotated["amountOut"], "3.2");

        let wrapped = annotate_quote(&args, json!("3.2"));
        assert_eq!(wrapped, json!({"data": "3.2", "text": "Quote in terms of kaddex.kdx"}));
    }

    #[test]
    fn response_text_keeps_strings_verbatim() {
        assert_eq!(response_text(&json!("hello")), "hello");
        assert_eq!(response_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
