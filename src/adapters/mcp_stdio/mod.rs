mod error_contract;
mod rpc;
mod schema;
mod tool_local;
mod transport;

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};
use tokio::time::{Duration, Instant};

use crate::app::tool_usecases::ToolUseCases;
use crate::domain::errors::DomainError;
use crate::domain::types::{annotated_file_name, ToolName};

use error_contract::domain_error_response;
use rpc::{RpcEnvelope, RpcRequest, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, SERVER_SHUT_DOWN};
use schema::{tools_schema, EXPORT_FILES, REGEX_TESTER};
use tool_local::{handle_export_files, handle_regex_tester};
use transport::{read_frame, write_frame, Framing, MAX_FRAME_BYTES};

const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

/// Serve MCP over the process's stdin/stdout until EOF or `exit`.
pub async fn start_mcp_server(uc: Arc<ToolUseCases>, initialize_timeout: Duration) -> anyhow::Result<()> {
    serve(uc, initialize_timeout, tokio::io::stdin(), tokio::io::stdout()).await
}

pub async fn serve<R, W>(
    uc: Arc<ToolUseCases>,
    initialize_timeout: Duration,
    input: R,
    output: W,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let init_deadline = Instant::now() + initialize_timeout;
    let mut initialized = false;
    let mut shutdown_requested = false;
    let mut reply_framing: Option<Framing> = None;

    loop {
        let read_result = if initialized {
            read_frame(&mut reader, MAX_FRAME_BYTES).await
        } else {
            match tokio::time::timeout_at(init_deadline, read_frame(&mut reader, MAX_FRAME_BYTES)).await {
                Ok(result) => result,
                Err(_) => anyhow::bail!(
                    "no initialize received within {:?}; closing server",
                    initialize_timeout
                ),
            }
        };

        let frame = match read_result {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("frame read error: {}", e);
                continue;
            }
        };
        let framing = *reply_framing.get_or_insert(frame.framing);

        let request: RpcRequest = match serde_json::from_str(&frame.body) {
            Ok(r) => r,
            Err(e) => {
                let envelope = RpcEnvelope::failure(Value::Null, PARSE_ERROR, format!("parse error: {}", e));
                write_frame(&mut writer, &envelope, framing).await?;
                continue;
            }
        };

        if request.method == "initialize" {
            initialized = true;
        }

        match request.method.as_str() {
            "shutdown" => {
                shutdown_requested = true;
                if !request.is_notification() {
                    let envelope = RpcEnvelope::success(request.reply_id(), json!(null));
                    write_frame(&mut writer, &envelope, framing).await?;
                }
                continue;
            }
            "exit" => {
                if !request.is_notification() {
                    let envelope = RpcEnvelope::success(request.reply_id(), json!(null));
                    write_frame(&mut writer, &envelope, framing).await?;
                }
                break;
            }
            _ => {}
        }

        if shutdown_requested {
            if !request.is_notification() {
                let envelope = RpcEnvelope::failure(
                    request.reply_id(),
                    SERVER_SHUT_DOWN,
                    "server is shut down; only 'exit' is accepted",
                );
                write_frame(&mut writer, &envelope, framing).await?;
            }
            continue;
        }

        if let Some(envelope) = handle_request(&request, &uc).await {
            write_frame(&mut writer, &envelope, framing).await?;
        }
    }

    Ok(())
}

async fn handle_request(request: &RpcRequest, uc: &ToolUseCases) -> Option<RpcEnvelope> {
    let id = request.reply_id();
    let envelope = match request.method.as_str() {
        "initialize" => RpcEnvelope::success(
            id,
            json!({
                "protocolVersion": protocol_version(request.params.as_ref()),
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": "dev-toolkit",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "ping" => RpcEnvelope::success(id, json!({})),
        "notifications/initialized" | "initialized" => RpcEnvelope::success(id, json!(null)),
        "tools/list" => RpcEnvelope::success(id, tools_schema(uc.export_enabled())),
        "tools/call" => call_tool(id, request.params.as_ref(), uc).await,
        other => RpcEnvelope::failure(id, METHOD_NOT_FOUND, format!("method not found: '{}'", other)),
    };

    if request.is_notification() {
        None
    } else {
        Some(envelope)
    }
}

async fn call_tool(id: Value, params: Option<&Value>, uc: &ToolUseCases) -> RpcEnvelope {
    let name = params
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let args = params
        .and_then(|p| p.get("arguments"))
        .filter(|a| !a.is_null())
        .cloned()
        .unwrap_or_else(|| json!({}));
    if !args.is_object() {
        return RpcEnvelope::failure(id, INVALID_PARAMS, "tool arguments must be an object");
    }

    let outcome = match name {
        REGEX_TESTER => return handle_regex_tester(id, &args, uc),
        EXPORT_FILES if uc.export_enabled() => handle_export_files(&args, uc).await,
        _ => match name.parse::<ToolName>() {
            Ok(tool) => run_flow(tool, &args, uc).await,
            Err(_) => {
                return RpcEnvelope::failure(id, INVALID_PARAMS, format!("unknown tool '{}'", name));
            }
        },
    };

    match outcome {
        Ok(result) => RpcEnvelope::success(id, result),
        Err(err) => domain_error_response(id, &err),
    }
}

async fn run_flow(tool: ToolName, args: &Value, uc: &ToolUseCases) -> Result<Value, DomainError> {
    let response = uc.invoke(tool, args).await?;
    let mut body = json!({ "tool": tool.as_str(), "output": response.into_value() });
    // Suggested download name for the annotated source.
    if tool == ToolName::DocstringGenerator {
        if let Some(language) = args.get("language").and_then(Value::as_str) {
            body["fileName"] = Value::from(annotated_file_name(language));
        }
    }
    tool_result(&body)
}

fn protocol_version(params: Option<&Value>) -> &str {
    params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_PROTOCOL_VERSION)
}

pub(super) fn to_json_text(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{\"error\":true}".to_string())
}

pub(super) fn tool_success(tool: &str, output: Value) -> Result<Value, DomainError> {
    tool_result(&json!({ "tool": tool, "output": output }))
}

fn tool_result(body: &Value) -> Result<Value, DomainError> {
    let text = serde_json::to_string(body)?;
    if text.len() > MAX_FRAME_BYTES {
        return Err(DomainError::InvalidData(format!(
            "tool output too large: {} bytes (max {})",
            text.len(),
            MAX_FRAME_BYTES
        )));
    }
    Ok(json!({
        "content": [{ "type": "text", "text": text }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{CompletionPort, CompletionRequest};
    use crate::domain::errors::Result;
    use async_trait::async_trait;

    struct EchoCommit;

    #[async_trait]
    impl CompletionPort for EchoCommit {
        async fn complete(&self, request: &CompletionRequest) -> Result<Value> {
            match request.tool {
                ToolName::DocstringGenerator => Ok(json!({ "annotatedCode": "# adds\ndef add(a, b): ..." })),
                _ => Ok(json!({ "commitMessage": "feat: add greeting" })),
            }
        }
    }

    fn use_cases() -> Arc<ToolUseCases> {
        Arc::new(ToolUseCases::new(Arc::new(EchoCommit)))
    }

    async fn exchange(lines: &[Value]) -> Vec<Value> {
        let mut input = String::new();
        for line in lines {
            input.push_str(&line.to_string());
            input.push('\n');
        }
        let mut output = Vec::new();
        serve(use_cases(), Duration::from_secs(5), input.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn content_json(reply: &Value) -> Value {
        serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}),
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
            json!({"jsonrpc":"2.0","id":2,"method":"initialize"}),
        ])
        .await;
        assert_eq!(replies.len(), 2, "notifications get no reply");
        assert_eq!(replies[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(replies[1]["result"]["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_rpc_level_errors() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize"}),
            json!({"jsonrpc":"2.0","id":2,"method":"resources/list"}),
            json!({"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope","arguments":{}}}),
            json!({"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"code-fixer","arguments":[1]}}),
            json!({"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"export-files","arguments":{}}}),
        ])
        .await;
        assert_eq!(replies[1]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(replies[2]["error"]["code"], INVALID_PARAMS);
        assert_eq!(replies[3]["error"]["code"], INVALID_PARAMS);
        assert_eq!(replies[4]["error"]["code"], INVALID_PARAMS, "export disabled");
    }

    #[tokio::test]
    async fn test_flow_call_returns_tool_and_output() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize"}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{
                "name":"commit-message-generator","arguments":{"diff":"+hello"}}}),
        ])
        .await;
        let body = content_json(&replies[1]);
        assert_eq!(body["tool"], "commit-message-generator");
        assert_eq!(body["output"], json!({ "commitMessage": "feat: add greeting" }));
    }

    #[tokio::test]
    async fn test_docstring_result_suggests_file_name() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize"}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{
                "name":"docstring-generator",
                "arguments":{"code":"def add(a, b): ...","language":"python 3"}}}),
        ])
        .await;
        let body = content_json(&replies[1]);
        assert_eq!(body["fileName"], "annotated_code.python");
        assert_eq!(body["output"]["annotatedCode"], "# adds\ndef add(a, b): ...");
    }

    #[tokio::test]
    async fn test_regex_tester_reports_pattern_error_with_segments() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize"}),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{
                "name":"regex-tester","arguments":{"pattern":"(","text":"order 42"}}}),
        ])
        .await;
        assert_eq!(replies[1]["result"]["isError"], true);
        let body = content_json(&replies[1]);
        assert_eq!(body["kind"], "pattern");
        assert_eq!(body["details"]["segments"], json!([{ "text": "order 42", "isMatch": false }]));
    }

    #[tokio::test]
    async fn test_malformed_json_line_gets_parse_error() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
        );
        let mut output = Vec::new();
        serve(use_cases(), Duration::from_secs(5), input.as_bytes(), &mut output)
            .await
            .unwrap();
        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[1]["error"]["code"], PARSE_ERROR);
        assert!(replies[1]["id"].is_null());
        assert_eq!(replies[2]["id"], 3);
    }

    #[tokio::test]
    async fn test_shutdown_then_only_exit() {
        let replies = exchange(&[
            json!({"jsonrpc":"2.0","id":1,"method":"initialize"}),
            json!({"jsonrpc":"2.0","id":2,"method":"shutdown"}),
            json!({"jsonrpc":"2.0","id":3,"method":"ping"}),
            json!({"jsonrpc":"2.0","id":4,"method":"exit"}),
            json!({"jsonrpc":"2.0","id":5,"method":"ping"}),
        ])
        .await;
        assert_eq!(replies.len(), 4, "nothing is read after exit");
        assert!(replies[1]["result"].is_null());
        assert_eq!(replies[2]["error"]["code"], SERVER_SHUT_DOWN);
        assert_eq!(replies[3]["id"], 4);
    }

    #[tokio::test]
    async fn test_missing_initialize_times_out() {
        let (client, server) = tokio::io::duplex(64);
        let (server_read, server_write) = tokio::io::split(server);
        let err = serve(use_cases(), Duration::from_millis(20), server_read, server_write)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no initialize received"));
        drop(client);
    }

    #[test]
    fn test_tool_success_rejects_oversized_output() {
        let err = tool_success("readme-generator", json!({ "markdown": "x".repeat(MAX_FRAME_BYTES) }))
            .unwrap_err();
        assert!(err.to_string().contains("tool output too large"));
    }
}
