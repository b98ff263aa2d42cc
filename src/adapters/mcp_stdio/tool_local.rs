use serde::Deserialize;
use serde_json::{json, Value};

use super::error_contract::{domain_error_response, domain_error_response_with};
use super::rpc::RpcEnvelope;
use super::schema::{EXPORT_FILES, REGEX_TESTER};
use super::tool_success;
use crate::app::tool_usecases::ToolUseCases;
use crate::domain::errors::{DomainError, FieldViolation};
use crate::domain::models::GeneratedFile;

#[derive(Debug, Deserialize)]
struct ExportArgs {
    stack: String,
    files: Vec<GeneratedFile>,
}

fn string_args<'a>(tool: &str, args: &'a Value, keys: &[&str]) -> Result<Vec<&'a str>, DomainError> {
    let mut values = Vec::with_capacity(keys.len());
    let mut violations = Vec::new();
    for key in keys {
        match args.get(*key).and_then(Value::as_str) {
            Some(v) => values.push(v),
            None => violations.push(FieldViolation::new(*key, "is required and must be a string")),
        }
    }
    if !violations.is_empty() {
        return Err(DomainError::Validation {
            tool: tool.to_string(),
            fields: violations,
        });
    }
    Ok(values)
}

/// Highlight matches locally. An invalid pattern is reported as a tool error
/// that still carries the single unmatched segment.
pub(super) fn handle_regex_tester(id: Value, args: &Value, uc: &ToolUseCases) -> RpcEnvelope {
    let values = match string_args(REGEX_TESTER, args, &["pattern", "text"]) {
        Ok(values) => values,
        Err(err) => return domain_error_response(id, &err),
    };
    let (pattern, text) = (values[0], values[1]);

    let highlight = uc.test_pattern(pattern, text);
    let payload = json!({
        "segments": highlight.segments,
        "matchCount": highlight.match_count()
    });

    if let Err(err) = highlight.check() {
        let extra = payload.as_object().cloned().unwrap_or_default();
        return domain_error_response_with(id, &err, extra);
    }
    match tool_success(REGEX_TESTER, payload) {
        Ok(result) => RpcEnvelope::success(id, result),
        Err(err) => domain_error_response(id, &err),
    }
}

pub(super) async fn handle_export_files(args: &Value, uc: &ToolUseCases) -> Result<Value, DomainError> {
    let parsed: ExportArgs = serde_json::from_value(args.clone())
        .map_err(|e| DomainError::InvalidData(format!("invalid {} arguments: {}", EXPORT_FILES, e)))?;
    let report = uc.export_boilerplate(&parsed.stack, &parsed.files).await?;
    tool_success(EXPORT_FILES, serde_json::to_value(report)?)
}
