use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("validation failed for {tool}: {}", summarize_fields(.fields))]
    Validation {
        tool: String,
        fields: Vec<FieldViolation>,
    },

    #[error("provider error ({kind}): {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },

    #[error("schema mismatch for {tool}: {}", join_violations(.violations))]
    SchemaMismatch {
        tool: String,
        violations: Vec<String>,
    },

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Io(String),

    #[error("failed to deserialize: {0}")]
    Deserialize(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }

    /// Whether the same request may succeed if the caller tries again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            DomainError::Provider { kind, .. } => kind.is_retryable(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err.to_string())
    }
}

// ── FieldViolation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn summarize_fields(fields: &[FieldViolation]) -> String {
    fields
        .iter()
        .map(|v| format!("'{}' {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_violations(violations: &[String]) -> String {
    violations.join("; ")
}

// ── ProviderErrorKind ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Timeout,
    Network,
    RateLimited,
    Unavailable,
    Rejected,
    Blocked,
    MalformedReply,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Rejected => "rejected",
            ProviderErrorKind::Blocked => "blocked",
            ProviderErrorKind::MalformedReply => "malformed_reply",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Timeout
                | ProviderErrorKind::Network
                | ProviderErrorKind::RateLimited
                | ProviderErrorKind::Unavailable
        )
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_every_field() {
        let err = DomainError::Validation {
            tool: "code-reviewer".into(),
            fields: vec![
                FieldViolation::new("diff", "is required"),
                FieldViolation::new("focus", "must be one of: security, performance"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("code-reviewer"));
        assert!(msg.contains("'diff' is required"));
        assert!(msg.contains("'focus' must be one of"));
    }

    #[test]
    fn test_only_transient_provider_failures_are_retryable() {
        assert!(DomainError::provider(ProviderErrorKind::Timeout, "slow").is_retryable());
        assert!(DomainError::provider(ProviderErrorKind::RateLimited, "429").is_retryable());
        assert!(!DomainError::provider(ProviderErrorKind::MalformedReply, "junk").is_retryable());
        assert!(!DomainError::SchemaMismatch {
            tool: "regex-generator".into(),
            violations: vec!["'regex' is required".into()],
        }
        .is_retryable());
        assert!(!DomainError::Pattern("unclosed group".into()).is_retryable());
        assert!(!DomainError::Io("is a directory".into()).is_retryable());
    }
}
