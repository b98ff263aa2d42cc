use serde_json::{json, Map, Value};

use super::rpc::RpcEnvelope;
use super::to_json_text;
use crate::domain::errors::DomainError;

fn classify(err: &DomainError) -> (&'static str, &'static str, Map<String, Value>) {
    let mut details = Map::new();
    let (kind, code) = match err {
        DomainError::InvalidData(_) => ("validation", "invalid_data"),
        DomainError::Validation { tool, fields } => {
            details.insert("tool".into(), json!(tool));
            details.insert("fields".into(), json!(fields));
            ("validation", "invalid_input")
        }
        DomainError::Provider { kind, .. } => {
            details.insert("provider_kind".into(), json!(kind));
            ("provider", kind.as_str())
        }
        DomainError::SchemaMismatch { tool, violations } => {
            details.insert("tool".into(), json!(tool));
            details.insert("violations".into(), json!(violations));
            ("schema_mismatch", "schema_mismatch")
        }
        DomainError::Pattern(_) => ("pattern", "invalid_pattern"),
        DomainError::NotFound(_) => ("not_found", "not_found"),
        DomainError::Io(_) => ("io_error", "io_error"),
        DomainError::Deserialize(_) => ("deserialize_error", "deserialize_error"),
    };
    (kind, code, details)
}

pub(super) fn domain_error_response(id: Value, err: &DomainError) -> RpcEnvelope {
    domain_error_response_with(id, err, Map::new())
}

/// Same contract, with `extra` merged into `details`.
pub(super) fn domain_error_response_with(
    id: Value,
    err: &DomainError,
    extra: Map<String, Value>,
) -> RpcEnvelope {
    let (kind, code, mut details) = classify(err);
    details.extend(extra);

    let mut payload = json!({
        "error": true,
        "kind": kind,
        "code": code,
        "message": err.to_string(),
        "retryable": err.is_retryable(),
        "request_id": id
    });
    if !details.is_empty() {
        payload["details"] = Value::Object(details);
    }

    // Tool failures travel as a successful RPC result flagged with isError.
    RpcEnvelope::success(
        id,
        json!({
            "content": [{ "type": "text", "text": to_json_text(&payload) }],
            "isError": true
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{FieldViolation, ProviderErrorKind};

    fn body(envelope: &RpcEnvelope) -> Value {
        let result = envelope.result.as_ref().unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).expect("error body must be strict JSON")
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = DomainError::Validation {
            tool: "code-reviewer".into(),
            fields: vec![FieldViolation::new("diff", "must not be empty")],
        };
        let parsed = body(&domain_error_response(json!(42), &err));
        assert_eq!(parsed["error"], true);
        assert_eq!(parsed["kind"], "validation");
        assert_eq!(parsed["code"], "invalid_input");
        assert_eq!(parsed["retryable"], false);
        assert_eq!(parsed["request_id"], 42);
        assert_eq!(parsed["details"]["fields"][0]["field"], "diff");
    }

    #[test]
    fn test_provider_error_is_retryable_when_transient() {
        let err = DomainError::provider(ProviderErrorKind::RateLimited, "HTTP 429");
        let parsed = body(&domain_error_response(json!("req-1"), &err));
        assert_eq!(parsed["kind"], "provider");
        assert_eq!(parsed["code"], "rate_limited");
        assert_eq!(parsed["retryable"], true);
        assert_eq!(parsed["request_id"], "req-1");
        assert_eq!(parsed["details"]["provider_kind"], "rate_limited");
    }

    #[test]
    fn test_schema_mismatch_lists_violations() {
        let err = DomainError::SchemaMismatch {
            tool: "commit-message-generator".into(),
            violations: vec!["'commitMessage' must be a string, got number".into()],
        };
        let parsed = body(&domain_error_response(json!(1), &err));
        assert_eq!(parsed["kind"], "schema_mismatch");
        assert_eq!(parsed["retryable"], false);
        assert_eq!(
            parsed["details"]["violations"][0],
            "'commitMessage' must be a string, got number"
        );
    }

    #[test]
    fn test_extra_details_are_merged() {
        let mut extra = Map::new();
        extra.insert("matchCount".into(), json!(0));
        let parsed = body(&domain_error_response_with(
            json!(3),
            &DomainError::Pattern("unclosed group".into()),
            extra,
        ));
        assert_eq!(parsed["kind"], "pattern");
        assert_eq!(parsed["details"]["matchCount"], 0);
    }

    #[test]
    fn test_plain_errors_have_no_details() {
        let parsed = body(&domain_error_response(json!(1), &DomainError::NotFound("x".into())));
        assert_eq!(parsed["kind"], "not_found");
        assert!(parsed.get("details").is_none());
    }
}
