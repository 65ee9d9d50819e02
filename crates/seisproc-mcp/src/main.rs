// Rust guideline compliant 2026-02-13

mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};
use seisproc::{ToolConfig, ToolContext, ToolRegistry};

use crate::tools::SeisprocMcpServer;

/// MCP stdio server for the seisproc seismic tools.
#[derive(Parser, Debug)]
#[command(name = "seisproc-mcp", version)]
struct Args {
    /// Directory rendered figures are written to.
    #[arg(long, env = "SEISPROC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Inlines per chunk when converting SEG-Y to the MDIO store.
    #[arg(long)]
    chunk_inlines: Option<usize>,
}

#[tool_handler]
impl ServerHandler for SeisprocMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "SeisProc MCP Server: seismic tools for SEG-Y/MDIO conversion, section and time-slice plots, frequency spectra and SVD/median/Gaussian denoising. Figure tools return the path of the saved JPEG.".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    seisproc::utils::logging::init();
    let args = Args::parse();

    let mut config = ToolConfig::from_env();
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(n) = args.chunk_inlines {
        config = config.with_chunk_inlines(n);
    }
    tracing::info!(output_dir = %config.output_dir.display(), "starting seisproc MCP server");

    let registry = Arc::new(ToolRegistry::standard());
    let ctx = Arc::new(ToolContext::new(config));
    let service = SeisprocMcpServer::new(registry, ctx).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
