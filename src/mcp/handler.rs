//! # MCP Handler Module
//!
//! Model Context Protocol surface for the Kadena agent server. Incoming
//! JSON-RPC requests are dispatched to the same tools the agent uses.
//!
//! ## Supported Tools
//!
//! - `kadena_transaction` - Validate parameters and generate an unsigned transaction
//! - `validate_transaction` - Validate parameters only
//! - `kadena_analysis` - Ask the question-answering service
//! - `kadena_query` - Run a full K-Agent query with conversation history

use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    agent::kagent::{self, ANALYSIS_TOOL, TRANSACTION_TOOL},
    agent::prompts::K_AGENT_CHARACTER,
    kadena::{validate, Operation, ParameterSet},
    mcp::protocol::{error_codes, Request, Response},
    utils, AppState,
};

const VALIDATE_TOOL: &str = "validate_transaction";
const QUERY_TOOL: &str = "kadena_query";

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(text: String, payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": text }]);
    match payload {
        Value::Object(mut map) => {
            if !map.contains_key("content") {
                map.insert("content".into(), content);
            }
            Value::Object(map)
        }
        other => json!({
            "data": other,
            "content": content
        }),
    }
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Direct method calls are rewritten into tools/call
        TRANSACTION_TOOL | VALIDATE_TOOL | ANALYSIS_TOOL | QUERY_TOOL => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": req.method.clone(),
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let req_id = &req.id;

    match tool_name {
        TRANSACTION_TOOL => {
            let output = kagent::execute_transaction(&state, args).await;
            if let Some(message) = output.get("error").and_then(Value::as_str) {
                return Response::error_with_data(
                    req_id.clone(),
                    error_codes::INVALID_PARAMS,
                    message.to_string(),
                    output.clone(),
                );
            }
            let endpoint = args.get("endpoint").and_then(Value::as_str).unwrap_or_default();
            Response::success(
                req_id.clone(),
                make_texty_result(format!("Generated unsigned {} transaction", endpoint), output),
            )
        }
        VALIDATE_TOOL => {
            let res: Result<Response, Response> = (|| {
                let endpoint = utils::get_required_arg::<String>(args, "endpoint", req_id)?;
                let params = utils::get_required_arg::<ParameterSet>(args, "params", req_id)?;
                let params = validate(&state.registry, &state.config.chain_id_policy, &endpoint, params)
                    .map_err(|e| {
                        Response::error_with_data(
                            req_id.clone(),
                            error_codes::INVALID_PARAMS,
                            e.to_string(),
                            e.to_json(),
                        )
                    })?;
                let canonical = Operation::from_name(&endpoint)
                    .map(|op| op.as_str())
                    .unwrap_or_default();
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(
                        format!("Parameters are valid for {}", canonical),
                        json!({ "endpoint": canonical, "params": params }),
                    ),
                ))
            })();
            res.unwrap_or_else(|err_resp| err_resp)
        }
        ANALYSIS_TOOL => {
            let res: Result<Response, Response> = (async {
                let query = utils::get_required_arg::<String>(args, "query", req_id)?;
                let system_prompt = args
                    .get("systemPrompt")
                    .and_then(Value::as_str)
                    .unwrap_or(K_AGENT_CHARACTER);
                let output = state.analysis.analyze(&query, system_prompt).await.map_err(|e| {
                    error!("Analysis tool failed: {}", e);
                    Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, e.to_string())
                })?;
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result("Analysis complete".to_string(), output),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        QUERY_TOOL => {
            let res: Result<Response, Response> = (async {
                let query = utils::get_required_arg::<String>(args, "query", req_id)?;
                let history: Vec<String> = args
                    .get("history")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|_| {
                        Response::error(
                            req_id.clone(),
                            error_codes::INVALID_PARAMS,
                            "'history' must be a list of strings".into(),
                        )
                    })?
                    .unwrap_or_default();
                let result = kagent::run_query(&state, &query, history).await.map_err(|e| {
                    error!("K-Agent query failed: {:?}", e);
                    Response::error(req_id.clone(), error_codes::INTERNAL_ERROR, format!("{:#}", e))
                })?;
                let text = match &result.response {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let payload = serde_json::to_value(&result).unwrap_or(Value::Null);
                Ok(Response::success(req_id.clone(), make_texty_result(text, payload)))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        _ => Response::error(
            req.id.clone(),
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {}", tool_name),
        ),
    }
}

fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "kadena_agent",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Kadena agent server: answers questions about Kadena and generates unsigned transactions.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    let endpoints: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
    let mut tools: Vec<Value> = kagent::tool_specs()
        .into_iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": spec.parameters,
            })
        })
        .collect();
    tools.push(json!({
        "name": VALIDATE_TOOL,
        "description": "Check transaction parameters against the operation rules without calling the transaction API.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "endpoint": {"type": "string", "enum": endpoints},
                "params": {"type": "object", "description": "Parameters for the operation."}
            },
            "required": ["endpoint", "params"],
            "additionalProperties": false
        }
    }));
    tools.push(json!({
        "name": QUERY_TOOL,
        "description": "Ask K-Agent anything about Kadena, including requests for unsigned transactions.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The user's query."},
                "history": {"type": "array", "items": {"type": "string"}, "description": "History lines returned by the previous call."}
            },
            "required": ["query"],
            "additionalProperties": false
        }
    }));

    Response::success(req.id.clone(), json!({ "tools": tools }))
}
