use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::{
    app::ports::{CompletionPort, CompletionRequest, ExportFile, ExportReport, FileExportPort},
    domain::{
        errors::{DomainError, Result},
        flows::flow,
        highlight::{highlight, Highlight},
        models::{FlowInput, GeneratedFile, ToolResponse},
        types::{project_slug, RelativePath, ToolName},
    },
};

pub struct ToolUseCases {
    completion: Arc<dyn CompletionPort>,
    export: Option<Arc<dyn FileExportPort>>,
}

impl ToolUseCases {
    pub fn new(completion: Arc<dyn CompletionPort>) -> Self {
        Self {
            completion,
            export: None,
        }
    }

    pub fn with_export(mut self, export: Arc<dyn FileExportPort>) -> Self {
        self.export = Some(export);
        self
    }

    pub fn export_enabled(&self) -> bool {
        self.export.is_some()
    }

    // ── flows ─────────────────────────────────────────────────────────────────

    /// Validate, render, dispatch once, check the reply.
    ///
    /// A validation failure returns before the provider is contacted. The
    /// provider is called exactly once otherwise, and its error is returned
    /// as-is.
    pub async fn invoke(&self, tool: ToolName, candidate: &Value) -> Result<ToolResponse> {
        let spec = flow(tool);
        let request = spec.validate(candidate)?;
        let completion = CompletionRequest {
            tool,
            prompt: spec.render(&request),
            output_schema: spec.output_json_schema(),
        };

        tracing::debug!(
            tool = %tool,
            prompt_bytes = completion.prompt.len(),
            "dispatching completion"
        );
        let reply = self.completion.complete(&completion).await.map_err(|err| {
            tracing::warn!(tool = %tool, retryable = err.is_retryable(), "completion failed: {}", err);
            err
        })?;

        spec.check_output(&reply).map_err(|err| {
            tracing::warn!(tool = %tool, "reply rejected: {}", err);
            err
        })
    }

    /// Typed variant of [`invoke`](Self::invoke).
    pub async fn run<I: FlowInput>(&self, input: &I) -> Result<I::Output> {
        let candidate = serde_json::to_value(input)?;
        self.invoke(I::TOOL, &candidate).await?.decode()
    }

    // ── local tools ───────────────────────────────────────────────────────────

    pub fn test_pattern(&self, pattern: &str, text: &str) -> Highlight {
        highlight(pattern, text)
    }

    pub async fn export_boilerplate(
        &self,
        stack: &str,
        files: &[GeneratedFile],
    ) -> Result<ExportReport> {
        let Some(export) = &self.export else {
            return Err(DomainError::InvalidData(
                "file export is not configured (set DEV_TOOLKIT_EXPORT_ROOT)".into(),
            ));
        };
        if files.is_empty() {
            return Err(DomainError::InvalidData("no files to export".into()));
        }

        let mut seen = HashSet::new();
        let mut prepared = Vec::with_capacity(files.len());
        for file in files {
            let path = RelativePath::new(&file.path)?;
            if !seen.insert(path.clone()) {
                return Err(DomainError::InvalidData(format!(
                    "duplicate file path '{}'",
                    path
                )));
            }
            prepared.push(ExportFile {
                path,
                content: file.content.clone(),
            });
        }

        let slug = project_slug(stack);
        let report = export.export(&slug, &prepared).await?;
        tracing::info!(
            "exported {} files ({} bytes) to {}",
            report.files.len(),
            report.total_bytes,
            report.directory
        );
        Ok(report)
    }
}
