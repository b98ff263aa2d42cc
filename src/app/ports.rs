use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    errors::Result,
    types::{RelativePath, ToolName},
};

// ── Ports ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// One outbound request. Returns the provider's reply parsed as JSON; the
    /// caller checks it against the output schema.
    async fn complete(&self, request: &CompletionRequest) -> Result<Value>;
}

#[async_trait]
pub trait FileExportPort: Send + Sync {
    /// Write `files` under a directory named `project`. Either every file is
    /// written or the call fails.
    async fn export(&self, project: &str, files: &[ExportFile]) -> Result<ExportReport>;
}

// ── Transfer objects ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub tool: ToolName,
    pub prompt: String,
    /// JSON schema descriptor of the expected reply.
    pub output_schema: Value,
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub path: RelativePath,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub directory: String,
    /// Relative paths in the order they were written.
    pub files: Vec<String>,
    pub total_bytes: u64,
    pub exported_at: DateTime<Utc>,
}
