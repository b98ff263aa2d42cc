//! Prompt Template Renderer.
//!
//! A template is a declaration-ordered list of blocks. Rendering walks the
//! list once and appends to a fresh string; the request is only read.

use serde_json::Value;

use super::models::ToolRequest;

#[derive(Debug, Clone, Copy)]
pub enum Block {
    /// Literal text.
    Text(&'static str),
    /// The named field, verbatim.
    Field(&'static str),
    /// Inner blocks, only when the named field is present.
    When(&'static str, &'static [Block]),
    /// Inner blocks once per element of the named array, in order.
    Each(&'static str, &'static [Block]),
    /// The current element inside `Each`.
    Item,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub blocks: &'static [Block],
}

impl PromptTemplate {
    pub const fn new(blocks: &'static [Block]) -> Self {
        Self { blocks }
    }

    pub fn render(&self, request: &ToolRequest) -> String {
        render(self, request)
    }
}

pub fn render(template: &PromptTemplate, request: &ToolRequest) -> String {
    let mut out = String::new();
    render_blocks(template.blocks, request, None, &mut out);
    out
}

fn render_blocks(blocks: &[Block], request: &ToolRequest, item: Option<&Value>, out: &mut String) {
    for block in blocks {
        match block {
            Block::Text(text) => out.push_str(text),
            Block::Field(name) => {
                if let Some(value) = request.get(name) {
                    push_value(value, out);
                }
            }
            Block::When(name, inner) => {
                if request.is_present(name) {
                    render_blocks(inner, request, item, out);
                }
            }
            Block::Each(name, inner) => {
                if let Some(Value::Array(elements)) = request.get(name) {
                    for element in elements {
                        render_blocks(inner, request, Some(element), out);
                    }
                }
            }
            Block::Item => {
                if let Some(value) = item {
                    push_value(value, out);
                }
            }
        }
    }
}

fn push_value(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        other => out.push_str(&other.to_string()),
    }
}
