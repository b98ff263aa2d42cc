pub mod file_export_fs;
pub mod gemini_completion;
pub mod mcp_stdio;
