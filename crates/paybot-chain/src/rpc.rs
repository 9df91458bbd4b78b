//! JSON-RPC 2.0 plumbing for EVM endpoints.
//!
//! Provides the [`RpcTransport`] trait and [`HttpRpcTransport`], which
//! POSTs one request per call. Quantities come back as `0x`-prefixed hex
//! strings; [`parse_quantity_u64`] and [`parse_quantity_u256`] decode them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use paybot_types::ChainError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    /// Positional parameters.
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response.
///
/// A `null` result (pending receipt, unknown transaction) deserializes as
/// `result: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// The result value, `Value::Null` when absent, or the error object as
    /// [`ChainError::Rpc`].
    pub fn into_result(self) -> Result<Value, ChainError> {
        match (self.error, self.result) {
            (Some(err), _) => Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (None, result) => Ok(result.unwrap_or(Value::Null)),
        }
    }
}

/// A JSON-RPC endpoint.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `method` with positional `params` and return the raw result.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError>;
}

/// Transport that POSTs JSON-RPC requests over HTTP(S).
pub struct HttpRpcTransport {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpRpcTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        debug!(method, id, "sending rpc request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("{method}: HTTP request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("{method}: HTTP {status}: {body}")));
        }

        let response: JsonRpcResponse = resp.json().await.map_err(|e| {
            ChainError::InvalidResponse(format!("{method}: failed to parse response: {e}"))
        })?;
        response.into_result()
    }
}

fn hex_digits<'a>(value: &'a Value, what: &str) -> Result<&'a str, ChainError> {
    let text = value
        .as_str()
        .ok_or_else(|| ChainError::InvalidResponse(format!("{what}: expected hex string, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| ChainError::InvalidResponse(format!("{what}: missing 0x prefix in {text}")))?;
    Ok(if digits.is_empty() { "0" } else { digits })
}

/// Decode a hex quantity that fits in a `u64` (chain id, nonce, block).
pub fn parse_quantity_u64(value: &Value, what: &str) -> Result<u64, ChainError> {
    let digits = hex_digits(value, what)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("{what}: {e}")))
}

/// Decode a hex quantity as a 256-bit integer (balances, gas prices).
pub fn parse_quantity_u256(value: &Value, what: &str) -> Result<U256, ChainError> {
    let digits = hex_digits(value, what)?;
    U256::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("{what}: {e}")))
}
