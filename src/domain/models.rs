use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{DomainError, Result};
use super::types::{Priority, ReviewFocus, SchemaFormat, TestFramework, ToolName};

// ── ToolRequest ───────────────────────────────────────────────────────────────

/// Input that already passed its tool's Input Schema. Only the validator
/// constructs one, so holding a `ToolRequest` means every required field is
/// present and non-blank.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    tool: ToolName,
    fields: Map<String, Value>,
}

impl ToolRequest {
    pub(crate) fn new(tool: ToolName, fields: Map<String, Value>) -> Self {
        Self { tool, fields }
    }

    pub fn tool(&self) -> ToolName {
        self.tool
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Template truthiness: absent, null, false, zero, `""` and `[]` are all
    /// treated as not present.
    pub fn is_present(&self, name: &str) -> bool {
        match self.fields.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(_)) => true,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

// ── ToolResponse ──────────────────────────────────────────────────────────────

/// A provider reply that matched its tool's Output Schema exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    tool: ToolName,
    fields: Map<String, Value>,
}

impl ToolResponse {
    pub(crate) fn new(tool: ToolName, fields: Map<String, Value>) -> Self {
        Self { tool, fields }
    }

    pub fn tool(&self) -> ToolName {
        self.tool
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Decode into the typed record for this tool.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let tool = self.tool;
        serde_json::from_value(Value::Object(self.fields)).map_err(|e| {
            DomainError::SchemaMismatch {
                tool: tool.as_str().to_string(),
                violations: vec![e.to_string()],
            }
        })
    }
}

// ── typed flow API ────────────────────────────────────────────────────────────

/// Typed input for one flow; the associated output is what a successful
/// invocation decodes into.
pub trait FlowInput: Serialize + Send + Sync {
    const TOOL: ToolName;
    type Output: DeserializeOwned;
}

macro_rules! flow_input {
    ($input:ty => $tool:ident, $output:ty) => {
        impl FlowInput for $input {
            const TOOL: ToolName = ToolName::$tool;
            type Output = $output;
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMessageInput {
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommitMessage {
    pub commit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogInput {
    pub log: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorExplanation {
    pub explanation: String,
    pub steps_to_fix: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeInput {
    pub name: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Readme {
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexInput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedRegex {
    pub regex: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOptimizerInput {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptVariant {
    pub title: String,
    pub prompt: String,
    pub tips: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptimizedPrompt {
    pub optimized_prompt: String,
    pub variants: Vec<PromptVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTestInput {
    pub code: String,
    pub framework: TestFramework,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnitTests {
    pub test_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeFixInput {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeFix {
    pub patch: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlQueryInput {
    pub query: String,
    pub schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SqlQuery {
    pub sql_query: String,
    pub assumptions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocstringInput {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnnotatedCode {
    pub annotated_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoilerplateInput {
    pub stack: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Boilerplate {
    pub files: Vec<GeneratedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReviewInput {
    pub diff: String,
    pub focus: ReviewFocus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewIssue {
    pub priority: Priority,
    pub description: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeReview {
    pub issues: Vec<ReviewIssue>,
}

impl CodeReview {
    /// Issues ordered High → Low, keeping reply order within a priority.
    pub fn prioritized(&self) -> Vec<&ReviewIssue> {
        let mut issues: Vec<&ReviewIssue> = self.issues.iter().collect();
        issues.sort_by_key(|issue| issue.priority);
        issues
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocsInput {
    pub schema: String,
    pub format: SchemaFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiExample {
    pub language: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocs {
    pub documentation: String,
    pub examples: Vec<ApiExample>,
}

flow_input!(CommitMessageInput => CommitMessageGenerator, CommitMessage);
flow_input!(ErrorLogInput => ErrorLogExplainer, ErrorExplanation);
flow_input!(ReadmeInput => ReadmeGenerator, Readme);
flow_input!(RegexInput => RegexGenerator, GeneratedRegex);
flow_input!(PromptOptimizerInput => PromptOptimizer, OptimizedPrompt);
flow_input!(UnitTestInput => UnitTestGenerator, UnitTests);
flow_input!(CodeFixInput => CodeFixer, CodeFix);
flow_input!(SqlQueryInput => SqlQueryBuilder, SqlQuery);
flow_input!(DocstringInput => DocstringGenerator, AnnotatedCode);
flow_input!(BoilerplateInput => BoilerplateGenerator, Boilerplate);
flow_input!(CodeReviewInput => CodeReviewer, CodeReview);
flow_input!(SchemaDocsInput => SchemaDocsGenerator, SchemaDocs);
