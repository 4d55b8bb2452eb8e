// src/mcp/protocol.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request. A missing or null `id` marks a notification.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self::failure(id, ErrorObject { code, message, data: None })
    }

    pub fn error_with_data(id: Value, code: i32, message: String, data: Value) -> Self {
        Self::failure(id, ErrorObject { code, message, data: Some(data) })
    }

    fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_id_is_notification() {
        let req: Request = serde_json::from_str(r#"{"method":"notifications/initialized"}"#).unwrap();
        assert_eq!(req.jsonrpc, "2.0");
        assert!(req.is_notification());
        assert!(req.params.is_none());
    }

    #[test]
    fn success_omits_error_field() {
        let resp = serde_json::to_value(Response::success(json!(4), json!({"ok": true}))).unwrap();
        assert_eq!(resp, json!({"jsonrpc": "2.0", "id": 4, "result": {"ok": true}}));
    }

    #[test]
    fn error_carries_optional_data() {
        let plain = serde_json::to_value(Response::error(json!("a"), error_codes::INTERNAL_ERROR, "boom".into())).unwrap();
        assert!(plain.get("result").is_none());
        assert!(plain["error"].get("data").is_none());

        let with_data = Response::error_with_data(
            json!("a"),
            error_codes::INVALID_PARAMS,
            "bad".into(),
            json!({"error": "bad"}),
        );
        assert_eq!(with_data.error.unwrap().data, Some(json!({"error": "bad"})));
    }
}
