//! JSON-RPC 2.0 Envelopes
//!
//! Newline-delimited request/response envelopes for the stdio transport.
//! Only malformed envelopes become transport-level errors; application
//! failures travel inside successful result payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// An inbound request envelope
#[derive(Clone, Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,

    /// Absent for notifications, which receive no response
    #[serde(default)]
    pub id: Option<Value>,

    pub method: String,

    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Notifications carry no id and expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// An outbound response envelope
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,

    pub id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A transport-level error payload
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("Parse error: {}", detail),
        }
    }

    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: format!("Invalid request: {}", detail),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: format!("Invalid params: {}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parsing() {
        let request: Request = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}"#,
        )
        .unwrap();

        assert_eq!(request.method, "tools/list");
        assert!(!request.is_notification());
    }

    #[test]
    fn test_notification_has_no_id() {
        let request: Request = serde_json::from_str(
            r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#,
        )
        .unwrap();

        assert!(request.is_notification());
    }

    #[test]
    fn test_malformed_envelope_is_a_parse_error() {
        let result = serde_json::from_str::<Request>("{not json");
        assert!(result.is_err());

        let response = Response::error(Value::Null, RpcError::parse_error(result.unwrap_err()));
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["error"]["code"], json!(RpcError::PARSE_ERROR));
        assert!(encoded.get("result").is_none());
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = Response::success(json!(7), json!({"ok": true}));
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["jsonrpc"], "2.0");
        assert_eq!(encoded["id"], json!(7));
        assert_eq!(encoded["result"]["ok"], json!(true));
        assert!(encoded.get("error").is_none());
    }
}
