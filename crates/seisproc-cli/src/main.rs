//! SeismicProcAgent command line.
//!
//! Subcommands:
//!  - `chat`    : interactive LLM loop that can call the seismic tools.
//!  - `tools`   : list the available tools and their parameters.
//!  - `call`    : run one tool with JSON arguments and print its output.
//!  - `convert` : SEG-Y to chunked store, with a progress bar.
//!
//! Tools run in-process by default; `--mcp-config` switches to MCP servers
//! launched from an `{"mcpServers": {...}}` file instead.
//!
//! Usage examples:
//!  seisproc chat --mcp-config configs/seismic_tools.json
//!  seisproc call mdio_plot_inline --args '{"data_path":"/data","data":"f3.sgy","inline":101}'

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

mod agent;
mod backend;
mod config;
mod llm;
mod mcp_client;

use crate::agent::{parse_arguments, Agent, DEFAULT_MAX_STEPS};
use crate::backend::{ToolBackend, ToolDescriptor};
use crate::config::{LlmSettings, McpConfig};
use crate::llm::OpenAiClient;

use seisproc::segy::{TraceKeys, DEFAULT_CROSSLINE_BYTE, DEFAULT_INLINE_BYTE};
use seisproc::utils::logging;
use seisproc::volume::convert_segy;
use seisproc::{SegyCube, ToolConfig, ToolContext, ToolRegistry};

const BANNER: &str = "=== SeismicProcAgent Interactive Command Line ===";
const PROMPT: &str = "Please enter your query: ";
const EXIT_MESSAGE: &str = "Program exited.";

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "seisproc",
    about = "SeismicProcAgent CLI: seismic tools and an LLM chat loop",
    version
)]
struct Cli {
    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with an LLM that can call the seismic tools.
    Chat(ChatArgs),

    /// List the available tools.
    Tools(BackendArgs),

    /// Run a single tool and print its output.
    Call(CallArgs),

    /// Convert a SEG-Y file into a chunked volume store.
    Convert(ConvertArgs),
}

/// Tool backend selection shared by `chat`, `tools` and `call`.
#[derive(Args, Debug)]
struct BackendArgs {
    /// MCP server config (`{"mcpServers": {...}}`). Without it tools run in-process.
    #[arg(long, value_name = "PATH")]
    mcp_config: Option<PathBuf>,

    /// Directory for figures written by in-process tools.
    #[arg(long, value_name = "DIR", env = "SEISPROC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[command(flatten)]
    backend: BackendArgs,

    /// Maximum LLM/tool round trips per query.
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,
}

#[derive(Args, Debug)]
struct CallArgs {
    /// Tool name, e.g. `overview`.
    name: String,

    /// Tool arguments as a JSON object.
    #[arg(long, default_value = "{}")]
    args: String,

    #[command(flatten)]
    backend: BackendArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// SEG-Y file to convert.
    #[arg(value_name = "SEGY")]
    input: PathBuf,

    /// Store directory (default: `<input dir>/<stem>.mdio`).
    #[arg(long, short = 'o', value_name = "DIR")]
    out: Option<PathBuf>,

    /// Trace-header byte of the inline number (1-based).
    #[arg(long, default_value_t = DEFAULT_INLINE_BYTE)]
    inline_byte: usize,

    /// Trace-header byte of the crossline number (1-based).
    #[arg(long, default_value_t = DEFAULT_CROSSLINE_BYTE)]
    crossline_byte: usize,

    /// Inlines per chunk file.
    #[arg(long, env = "SEISPROC_CHUNK_INLINES")]
    chunk_inlines: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; MODEL_NAME etc. may come from the real environment.
    let _ = dotenvy::dotenv();
    logging::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat(args) => run_chat(args).await,
        Commands::Tools(args) => run_tools(args),
        Commands::Call(args) => run_call(args).await,
        Commands::Convert(args) => run_convert(args).await,
    }
}

fn tool_config(output_dir: Option<&Path>) -> ToolConfig {
    let cfg = ToolConfig::from_env();
    match output_dir {
        Some(dir) => cfg.with_output_dir(dir),
        None => cfg,
    }
}

fn build_backend(args: &BackendArgs) -> Result<ToolBackend> {
    match &args.mcp_config {
        Some(path) => {
            let config = McpConfig::load(path)?;
            ToolBackend::connect(&config)
                .with_context(|| format!("starting MCP servers from {}", path.display()))
        }
        None => {
            let ctx = ToolContext::new(tool_config(args.output_dir.as_deref()));
            Ok(ToolBackend::local(ToolRegistry::standard(), ctx))
        }
    }
}

async fn run_chat(args: ChatArgs) -> Result<()> {
    let settings = LlmSettings::from_env()?;
    tracing::info!(provider = ?settings.provider, model = %settings.model, "chat model");
    let backend = Arc::new(build_backend(&args.backend)?);
    let model = Arc::new(OpenAiClient::new(settings));
    let mut agent = Agent::new(model, backend, args.max_steps);

    println!("{BANNER}");
    println!("Type your query and press Enter to execute; type 'exit' or 'quit' to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush().context("flushing stdout")?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            println!("{EXIT_MESSAGE}");
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            println!("⚠️ Please enter valid content, or type 'exit' to quit.");
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            println!("{EXIT_MESSAGE}");
            break;
        }

        match agent.run(query).await {
            Ok(answer) => println!("\n{answer}\n"),
            Err(e) => println!("❌ Error during call: {e:#}\n"),
        }
    }
    Ok(())
}

fn run_tools(args: BackendArgs) -> Result<()> {
    let backend = build_backend(&args)?;
    for tool in backend.tools() {
        print_tool(&tool);
    }
    Ok(())
}

fn print_tool(tool: &ToolDescriptor) {
    println!("{}", tool.name);
    println!("    {}", tool.description);
    let required: Vec<&str> = tool.parameters["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if let Some(props) = tool.parameters["properties"].as_object() {
        for (name, schema) in props {
            let kind = schema["type"].as_str().unwrap_or("any");
            let note = match schema.get("default") {
                Some(d) => format!("default {d}"),
                None if required.contains(&name.as_str()) => "required".to_string(),
                None => "optional".to_string(),
            };
            let desc = schema["description"].as_str().unwrap_or_default();
            println!("    --{name} <{kind}> ({note}) {desc}");
        }
    }
}

async fn run_call(args: CallArgs) -> Result<()> {
    let params = parse_arguments(&args.args)?;
    let backend = build_backend(&args.backend)?;
    let text = backend
        .call(&args.name, params)
        .await
        .with_context(|| format!("tool '{}' failed", args.name))?;
    println!("{text}");
    Ok(())
}

fn default_store_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = seisproc::tools::dataset_stem(&name);
    input.with_file_name(format!("{stem}.mdio"))
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let keys = TraceKeys::new(args.inline_byte, args.crossline_byte)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| default_store_path(&args.input));
    let chunk_inlines = args
        .chunk_inlines
        .unwrap_or_else(|| ToolConfig::from_env().chunk_inlines);

    let cube = SegyCube::open_async(args.input.clone(), keys)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;
    let (n_il, n_xl, ns) = cube.volume.geometry().shape();
    println!(
        "Read {}: {n_il} inlines x {n_xl} crosslines x {ns} samples ({} live traces)",
        args.input.display(),
        cube.live_traces()
    );

    let target = out.clone();
    let meta = tokio::task::spawn_blocking(move || convert_with_progress(&cube, &target, chunk_inlines))
        .await
        .context("conversion task failed")??;

    println!(
        "Wrote {} ({} chunks of {} inlines)",
        out.display(),
        meta.chunk_count(),
        meta.chunk_inlines
    );
    Ok(())
}

#[cfg(feature = "progress")]
fn convert_with_progress(
    cube: &SegyCube,
    out: &Path,
    chunk_inlines: usize,
) -> Result<seisproc::volume::StoreMetadata> {
    use indicatif::{ProgressBar, ProgressStyle};
    use seisproc::volume::ProgressCallback;

    const STEPS: u64 = 100;
    let bar = ProgressBar::new(STEPS);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    bar.set_style(style);
    bar.set_message("Writing chunks...");

    let progress_cb: ProgressCallback = Arc::new({
        let bar = bar.clone();
        move |msg: String, fraction: f32| {
            bar.set_message(msg);
            bar.set_position((fraction * STEPS as f32).floor() as u64);
        }
    });

    let meta = convert_segy(cube, out, chunk_inlines, Some(&progress_cb))
        .with_context(|| format!("converting to {}", out.display()))?;
    bar.finish_with_message("Conversion complete.");
    Ok(meta)
}

#[cfg(not(feature = "progress"))]
fn convert_with_progress(
    cube: &SegyCube,
    out: &Path,
    chunk_inlines: usize,
) -> Result<seisproc::volume::StoreMetadata> {
    convert_segy(cube, out, chunk_inlines, None)
        .with_context(|| format!("converting to {}", out.display()))
}
