use anyhow::{Context, Result};
use mockito::Server;
use serde_json::{json, Value};
use std::process::Stdio;
use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

const MAX_FRAME_BYTES: usize = 1024 * 1024;

struct McpE2EClient {
    child: Child,
    stdin: tokio::io::BufWriter<tokio::process::ChildStdin>,
    stdout: BufReader<tokio::process::ChildStdout>,
    next_id: u64,
}

impl McpE2EClient {
    async fn spawn(provider_url: &str, export_root: Option<&std::path::Path>) -> Result<Self> {
        let mut command = Command::new(resolve_binary_path()?);
        command
            .env("DEV_TOOLKIT_LOG", "off")
            .env("GEMINI_API_KEY", "e2e-key")
            .env("DEV_TOOLKIT_MODEL", "gemini-e2e")
            .env("DEV_TOOLKIT_PROVIDER_URL", provider_url)
            .env_remove("GOOGLE_API_KEY")
            .env_remove("DEV_TOOLKIT_EXPORT_ROOT")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        if let Some(root) = export_root {
            command.env("DEV_TOOLKIT_EXPORT_ROOT", root);
        }
        let mut child = command.spawn().context("spawn MCP server")?;

        let stdin = tokio::io::BufWriter::new(child.stdin.take().context("missing piped stdin")?);
        let stdout = BufReader::new(child.stdout.take().context("missing piped stdout")?);
        let mut client = Self {
            child,
            stdin,
            stdout,
            next_id: 0,
        };

        let init = client
            .request("initialize", json!({ "protocolVersion": "2025-06-18" }))
            .await?;
        anyhow::ensure!(init["result"]["protocolVersion"] == "2025-06-18", "bad initialize reply: {init}");
        client
            .notify("notifications/initialized", json!({}))
            .await?;
        Ok(client)
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;
        let reply = read_mcp_response(&mut self.stdout).await?;
        anyhow::ensure!(reply["id"] == id, "reply id mismatch: {reply}");
        Ok(reply)
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<()> {
        self.send(json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .await
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    async fn send(&mut self, message: Value) -> Result<()> {
        let body = serde_json::to_vec(&message)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.stdin.write_all(header.as_bytes()).await?;
        self.stdin.write_all(&body).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn stop(mut self) -> Result<()> {
        let _ = self.request("shutdown", json!(null)).await;
        let _ = self.notify("exit", json!(null)).await;
        drop(self.stdin);
        let status = tokio::time::timeout(std::time::Duration::from_secs(5), self.child.wait()).await;
        if status.is_err() {
            self.child.kill().await.ok();
        }
        Ok(())
    }
}

fn resolve_binary_path() -> Result<std::path::PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_mcp-dev-toolkit") {
        return Ok(std::path::PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().context("resolve current test executable path")?;
    let debug_dir = current_exe
        .parent()
        .and_then(|p| p.parent())
        .context("resolve target/debug directory")?;
    let path = debug_dir.join("mcp-dev-toolkit");
    anyhow::ensure!(path.exists(), "missing mcp-dev-toolkit binary in '{}'", debug_dir.display());
    Ok(path)
}

fn parse_content_length(line: &str) -> Result<usize> {
    let (key, value) = line.split_once(':').context("malformed header")?;
    if !key.trim().eq_ignore_ascii_case("content-length") {
        anyhow::bail!("unsupported transport header: {key}");
    }
    let len = value.trim().parse::<usize>()?;
    anyhow::ensure!(len <= MAX_FRAME_BYTES, "content-length {} exceeds {}", len, MAX_FRAME_BYTES);
    Ok(len)
}

async fn read_mcp_response<R>(reader: &mut BufReader<R>) -> Result<Value>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            anyhow::bail!("unexpected EOF while reading header");
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let len = parse_content_length(trimmed)?;
        loop {
            let mut tail = String::new();
            if reader.read_line(&mut tail).await? == 0 {
                anyhow::bail!("unexpected EOF while reading header tail");
            }
            if tail.trim().is_empty() {
                break;
            }
        }
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await?;
        return Ok(serde_json::from_slice(&body)?);
    }
}

fn tool_payload(reply: &Value) -> Result<Value> {
    let text = reply["result"]["content"][0]["text"]
        .as_str()
        .context("missing text content payload")?;
    Ok(serde_json::from_str(text)?)
}

fn candidate_body(text: &str) -> String {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }] })
        .to_string()
}

#[tokio::test]
async fn e2e_lists_tools_and_runs_local_regex_tester() -> Result<()> {
    let server = Server::new_async().await;
    let mut client = McpE2EClient::spawn(&server.url(), None).await?;

    let listed = client.request("tools/list", json!({})).await?;
    let tools = listed["result"]["tools"].as_array().context("tools array")?;
    assert_eq!(tools.len(), 13);
    assert_eq!(tools[0]["name"], "commit-message-generator");
    assert_eq!(tools[12]["name"], "regex-tester");
    assert!(tools.iter().all(|t| t["name"] != "export-files"));

    let reply = client
        .call_tool("regex-tester", json!({ "pattern": "\\d+", "text": "order 42 item 7" }))
        .await?;
    assert!(reply["result"].get("isError").is_none());
    let payload = tool_payload(&reply)?;
    assert_eq!(payload["tool"], "regex-tester");
    assert_eq!(payload["output"]["matchCount"], 2);
    assert_eq!(payload["output"]["segments"][1], json!({ "text": "42", "isMatch": true }));

    let pong = client.request("ping", json!({})).await?;
    assert_eq!(pong["result"], json!({}));

    client.stop().await
}

#[tokio::test]
async fn e2e_generation_and_error_contracts() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-e2e:generateContent")
        .match_header("x-goog-api-key", "e2e-key")
        .with_status(200)
        .with_body(candidate_body(r#"{"commitMessage":"feat: log greeting"}"#))
        .expect(1)
        .create_async()
        .await;
    let mut client = McpE2EClient::spawn(&server.url(), None).await?;

    let ok = client
        .call_tool("commit-message-generator", json!({ "diff": "+console.log('hi')" }))
        .await?;
    let payload = tool_payload(&ok)?;
    assert_eq!(payload["tool"], "commit-message-generator");
    assert_eq!(payload["output"], json!({ "commitMessage": "feat: log greeting" }));

    let invalid = client
        .call_tool("code-reviewer", json!({ "diff": "", "focus": "security" }))
        .await?;
    assert_eq!(invalid["result"]["isError"], true);
    let body = tool_payload(&invalid)?;
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["retryable"], false);
    assert_eq!(body["details"]["fields"][0]["field"], "diff");

    let unknown = client.call_tool("summarize-everything", json!({})).await?;
    assert_eq!(unknown["error"]["code"], -32602);

    let missing = client.request("resources/list", json!({})).await?;
    assert_eq!(missing["error"]["code"], -32601);

    mock.assert_async().await;
    client.stop().await
}

#[tokio::test]
async fn e2e_export_files_when_configured() -> Result<()> {
    let server = Server::new_async().await;
    let dir = tempdir()?;
    let mut client = McpE2EClient::spawn(&server.url(), Some(dir.path())).await?;

    let listed = client.request("tools/list", json!({})).await?;
    let tools = listed["result"]["tools"].as_array().context("tools array")?;
    assert_eq!(tools.last().map(|t| t["name"].clone()), Some(json!("export-files")));

    let reply = client
        .call_tool(
            "export-files",
            json!({
                "stack": "Vite + React",
                "files": [
                    { "path": "package.json", "content": "{}" },
                    { "path": "src/main.tsx", "content": "render()" }
                ]
            }),
        )
        .await?;
    let payload = tool_payload(&reply)?;
    assert_eq!(payload["output"]["files"], json!(["package.json", "src/main.tsx"]));

    // '+' is stripped from the slug, leaving a double dash.
    let written = std::fs::read_to_string(dir.path().join("vite--react").join("src/main.tsx"))?;
    assert_eq!(written, "render()");

    client.stop().await
}
