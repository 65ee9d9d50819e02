//! Minimal MCP client: line-delimited JSON-RPC over a child process's stdio.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};

use crate::config::McpServerConfig;

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// A tool advertised by a server's `tools/list`.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Text of a `tools/call` result and whether the server flagged it as an error.
#[derive(Clone, Debug, PartialEq)]
pub struct CallOutcome {
    pub text: String,
    pub is_error: bool,
}

pub struct McpClient {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
}

impl McpClient {
    /// Launch `config.command` and complete the initialize handshake.
    pub fn spawn(name: &str, config: &McpServerConfig) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn MCP server '{name}' ({})", config.command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("{name}: stdin unavailable"))?;
        let stdout = BufReader::new(
            child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("{name}: stdout unavailable"))?,
        );

        let mut client = McpClient {
            name: name.to_string(),
            child,
            stdin,
            stdout,
            next_id: 1,
        };
        client.initialize()?;
        tracing::info!(server = name, "MCP server ready");
        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        writeln!(self.stdin, "{message}")
            .with_context(|| format!("{}: write request failed", self.name))?;
        self.stdin
            .flush()
            .with_context(|| format!("{}: flush failed", self.name))
    }

    /// Read lines until the response carrying `id`; notifications are skipped.
    fn recv(&mut self, id: i64) -> Result<Value> {
        loop {
            let mut line = String::new();
            let n = self
                .stdout
                .read_line(&mut line)
                .with_context(|| format!("{}: read response failed", self.name))?;
            if n == 0 {
                bail!("{}: server closed its stdout", self.name);
            }
            if line.trim().is_empty() {
                continue;
            }
            let msg: Value = serde_json::from_str(&line)
                .with_context(|| format!("{}: response is not JSON", self.name))?;
            if msg.get("id").and_then(Value::as_i64) == Some(id) {
                return Ok(msg);
            }
            tracing::debug!(server = %self.name, message = %msg, "skipping unrelated message");
        }
    }

    fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))?;
        let resp = self.recv(id)?;
        if let Some(err) = resp.get("error") {
            let msg = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("{}: {method} failed: {msg}", self.name);
        }
        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("{}: {method} response has no result", self.name))
    }

    fn initialize(&mut self) -> Result<()> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "seisproc", "version": env!("CARGO_PKG_VERSION") }
            }),
        )?;
        self.send(&json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        }))
    }

    pub fn list_tools(&mut self) -> Result<Vec<RemoteTool>> {
        let result = self.request("tools/list", json!({}))?;
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("{}: tools/list returned no tools array", self.name))?;
        Ok(tools
            .iter()
            .filter_map(|t| {
                Some(RemoteTool {
                    name: t.get("name")?.as_str()?.to_string(),
                    description: t
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input_schema: t
                        .get("inputSchema")
                        .cloned()
                        .unwrap_or_else(|| json!({ "type": "object" })),
                })
            })
            .collect())
    }

    pub fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallOutcome> {
        let result = self.request("tools/call", json!({ "name": name, "arguments": arguments }))?;
        Ok(outcome_from_result(&result))
    }
}

/// Join the text parts of a `tools/call` result.
pub fn outcome_from_result(result: &Value) -> CallOutcome {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    CallOutcome {
        text,
        is_error: result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_joins_text_parts() {
        let result = json!({
            "content": [
                { "type": "text", "text": "Inline 101 plotted" },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "/tmp/out.jpg" }
            ],
            "isError": false
        });
        let out = outcome_from_result(&result);
        assert_eq!(out.text, "Inline 101 plotted\n/tmp/out.jpg");
        assert!(!out.is_error);
    }

    #[test]
    fn test_outcome_error_flag() {
        let out = outcome_from_result(&json!({
            "content": [{ "type": "text", "text": "inline 99 not found" }],
            "isError": true
        }));
        assert!(out.is_error);
        assert_eq!(outcome_from_result(&json!({})).text, "");
    }
}
