//! JSON-RPC 2.0 loop over line-delimited streams.
//!
//! Reads one request per line, answers one response per line. Supports the methods a
//! tool-calling client needs: `initialize`, `notifications/initialized`, `ping`,
//! `tools/list` and `tools/call`. Diagnostics go through `tracing` (stderr), never to
//! the output stream.
//!
//! Tool results travel as text content holding the JSON result, plus the same value
//! as `structuredContent`. Rejected tool arguments become a tool result with
//! `isError: true`; storage write failures do too, since the loop itself survives them.

use crate::api::BillbookApi;
use crate::error::{BillbookError, Result};
use crate::store::DataStore;
use crate::tools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use tracing::{debug, error, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "Client & Invoice Manager";
const INSTRUCTIONS: &str = "A server for managing clients and invoices. Use these tools to add clients, search for clients, create invoices, view invoices, and see dashboard statistics.";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Incoming JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Outgoing JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub struct Server<S: DataStore> {
    api: BillbookApi<S>,
    version: String,
}

impl<S: DataStore> Server<S> {
    pub fn new(api: BillbookApi<S>, version: impl Into<String>) -> Self {
        Self {
            api,
            version: version.into(),
        }
    }

    pub fn api(&self) -> &BillbookApi<S> {
        &self.api
    }

    /// Serves requests until `input` is exhausted.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        info!("billbook tool server running");
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(line) {
                serde_json::to_writer(&mut output, &response)?;
                output.write_all(b"\n")?;
                output.flush()?;
            }
        }
        info!("input closed, shutting down");
        Ok(())
    }

    fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return request.id.map(|id| {
                JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid JSON-RPC version")
            });
        }

        debug!(method = %request.method, "request");
        let outcome = self.dispatch(&request.method, request.params);

        // Notifications (no id) don't get a response
        let id = request.id?;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    fn dispatch(&self, method: &str, params: Value) -> std::result::Result<Value, (i64, String)> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": SERVER_NAME, "version": self.version},
                "instructions": INSTRUCTIONS
            })),
            "notifications/initialized" | "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({"tools": tools::definitions()})),
            "tools/call" => {
                let params: CallParams = serde_json::from_value(params)
                    .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?;
                let tool = params
                    .name
                    .parse::<tools::Tool>()
                    .map_err(|e| (INVALID_PARAMS, e.to_string()))?;
                Ok(self.call_tool(tool, params.arguments))
            }
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {}", other))),
        }
    }

    fn call_tool(&self, tool: tools::Tool, arguments: Value) -> Value {
        match tools::call(&self.api, tool, arguments) {
            Ok(result) => json!({
                "content": [{"type": "text", "text": result.to_string()}],
                "structuredContent": result,
                "isError": false
            }),
            Err(e) => {
                match &e {
                    BillbookError::InvalidArguments { .. } => {
                        warn!(tool = tool.name(), error = %e, "rejected tool arguments")
                    }
                    _ => error!(tool = tool.name(), error = %e, "tool call failed"),
                }
                json!({
                    "content": [{"type": "text", "text": e.to_string()}],
                    "isError": true
                })
            }
        }
    }
}
