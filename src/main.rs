use std::sync::Arc;

use mcp_dev_toolkit::adapters::file_export_fs::FileExportFsAdapter;
use mcp_dev_toolkit::adapters::gemini_completion::GeminiCompletionAdapter;
use mcp_dev_toolkit::adapters::mcp_stdio::start_mcp_server;
use mcp_dev_toolkit::app::tool_usecases::ToolUseCases;
use mcp_dev_toolkit::config::{AppConfig, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = if std::env::var("DEV_TOOLKIT_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_env("DEV_TOOLKIT_LOG")
    } else {
        tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr) // stdout carries MCP frames
        .with_env_filter(env_filter)
        .init();

    let config = AppConfig::from_env();
    if config.gemini.api_key.is_none() {
        tracing::warn!("no GEMINI_API_KEY or GOOGLE_API_KEY set; generation tools will fail");
    }
    tracing::info!("model: {} via {}", config.gemini.model, config.gemini.base_url);

    let completion = Arc::new(GeminiCompletionAdapter::new(config.gemini.clone()).map_err(anyhow::Error::new)?);
    let mut use_cases = ToolUseCases::new(completion);
    if let Some(root) = config.export_root.clone() {
        let export = FileExportFsAdapter::new(root).map_err(anyhow::Error::new)?;
        tracing::info!("export root: {}", export.root().display());
        use_cases = use_cases.with_export(Arc::new(export));
    }

    start_mcp_server(Arc::new(use_cases), config.initialize_timeout).await
}
