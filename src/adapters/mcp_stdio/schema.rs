use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::domain::flows::{all_flows, flow};
use crate::domain::types::ToolName;

pub(super) const REGEX_TESTER: &str = "regex-tester";
pub(super) const EXPORT_FILES: &str = "export-files";

static FLOW_TOOLS: Lazy<Vec<Value>> = Lazy::new(|| {
    all_flows()
        .iter()
        .map(|spec| {
            json!({
                "name": spec.tool.as_str(),
                "title": spec.title,
                "description": spec.description,
                "inputSchema": spec.input_json_schema()
            })
        })
        .collect()
});

static REGEX_TESTER_TOOL: Lazy<Value> = Lazy::new(|| {
    json!({
        "name": REGEX_TESTER,
        "title": "Regex Live Tester",
        "description": "Highlight every match of a regular expression in a test string. Runs locally.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "The regular expression, without slashes." },
                "text": { "type": "string", "description": "The text to test the pattern against." }
            },
            "required": ["pattern", "text"],
            "additionalProperties": false
        }
    })
});

static EXPORT_FILES_TOOL: Lazy<Value> = Lazy::new(|| {
    let files = flow(ToolName::BoilerplateGenerator).output_json_schema()["properties"]["files"].clone();
    json!({
        "name": EXPORT_FILES,
        "title": "Export Boilerplate Project",
        "description": "Write files produced by boilerplate-generator into a project directory under the export root.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "stack": { "type": "string", "description": "The stack the project was generated for; names the directory." },
                "files": files
            },
            "required": ["stack", "files"],
            "additionalProperties": false
        }
    })
});

pub(super) fn tools_schema(export_enabled: bool) -> Value {
    let mut tools = FLOW_TOOLS.clone();
    tools.push(REGEX_TESTER_TOOL.clone());
    if export_enabled {
        tools.push(EXPORT_FILES_TOOL.clone());
    }
    json!({ "tools": tools })
}
