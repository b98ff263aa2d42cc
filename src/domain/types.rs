use super::errors::{DomainError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

pub const MAX_EXPORT_PATH_LEN: usize = 1024;

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex must compile"));
static SLUG_REJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("slug regex must compile"));

// ── ToolName ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolName {
    CommitMessageGenerator,
    ErrorLogExplainer,
    ReadmeGenerator,
    RegexGenerator,
    PromptOptimizer,
    UnitTestGenerator,
    CodeFixer,
    SqlQueryBuilder,
    DocstringGenerator,
    BoilerplateGenerator,
    CodeReviewer,
    SchemaDocsGenerator,
}

impl ToolName {
    /// Catalog order.
    pub const ALL: [ToolName; 12] = [
        ToolName::CommitMessageGenerator,
        ToolName::ErrorLogExplainer,
        ToolName::ReadmeGenerator,
        ToolName::RegexGenerator,
        ToolName::PromptOptimizer,
        ToolName::UnitTestGenerator,
        ToolName::CodeFixer,
        ToolName::SqlQueryBuilder,
        ToolName::DocstringGenerator,
        ToolName::BoilerplateGenerator,
        ToolName::CodeReviewer,
        ToolName::SchemaDocsGenerator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CommitMessageGenerator => "commit-message-generator",
            ToolName::ErrorLogExplainer => "error-log-explainer",
            ToolName::ReadmeGenerator => "readme-generator",
            ToolName::RegexGenerator => "regex-generator",
            ToolName::PromptOptimizer => "prompt-optimizer",
            ToolName::UnitTestGenerator => "unit-test-generator",
            ToolName::CodeFixer => "code-fixer",
            ToolName::SqlQueryBuilder => "sql-query-builder",
            ToolName::DocstringGenerator => "docstring-generator",
            ToolName::BoilerplateGenerator => "boilerplate-generator",
            ToolName::CodeReviewer => "code-reviewer",
            ToolName::SchemaDocsGenerator => "schema-docs-generator",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == wanted)
            .ok_or_else(|| DomainError::NotFound(format!("unknown tool '{}'", wanted)))
    }
}

// ── enumerated literals ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewFocus {
    Security,
    Performance,
    Readability,
    BestPractices,
}

impl ReviewFocus {
    pub const LITERALS: &'static [&'static str] =
        &["security", "performance", "readability", "best-practices"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const LITERALS: &'static [&'static str] = &["High", "Medium", "Low"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    #[default]
    Jest,
    Vitest,
}

impl TestFramework {
    pub const LITERALS: &'static [&'static str] = &["jest", "vitest"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    #[default]
    Openapi,
    Graphql,
}

impl SchemaFormat {
    pub const LITERALS: &'static [&'static str] = &["openapi", "graphql"];
}

// ── RelativePath ──────────────────────────────────────────────────────────────

/// A generated file path that stays inside its export directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    pub fn new(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('\\', "/");
        let normalized = normalized.trim_start_matches("./").to_string();
        if normalized.is_empty() {
            return Err(DomainError::InvalidData("file path cannot be empty".into()));
        }
        if normalized.len() > MAX_EXPORT_PATH_LEN {
            return Err(DomainError::InvalidData(format!(
                "file path too long (max {})",
                MAX_EXPORT_PATH_LEN
            )));
        }
        let path = Path::new(&normalized);
        if path.is_absolute() || normalized.starts_with('/') {
            return Err(DomainError::InvalidData(format!(
                "file path '{}' must be relative",
                normalized
            )));
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(DomainError::InvalidData(format!(
                "file path '{}' must not contain parent directory segments",
                normalized
            )));
        }
        if normalized.ends_with('/') {
            return Err(DomainError::InvalidData(format!(
                "file path '{}' names a directory, not a file",
                normalized
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── download naming ───────────────────────────────────────────────────────────

/// Directory name for an exported boilerplate project.
pub fn project_slug(stack: &str) -> String {
    let lowered = stack.trim().to_lowercase();
    let dashed = WHITESPACE_RUN_RE.replace_all(&lowered, "-");
    let slug = SLUG_REJECT_RE.replace_all(&dashed, "").into_owned();
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}

pub fn annotated_file_name(language: &str) -> String {
    let extension = language.split(' ').next().unwrap_or_default();
    format!("annotated_code.{}", extension)
}
