//! Logging setup shared by the binaries.
//!
//! Everything goes to stderr: the MCP server speaks JSON-RPC on stdout and a
//! stray log line there would corrupt the stream.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `info` level. Calling this more than once
/// is harmless; later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
