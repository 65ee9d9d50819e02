//! Where tool calls go: the in-process registry or external MCP servers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use seisproc::{ToolContext, ToolRegistry};

use crate::config::McpConfig;
use crate::mcp_client::McpClient;

/// Name, description and JSON Schema of a tool, as offered to the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub enum ToolBackend {
    Local {
        registry: Arc<ToolRegistry>,
        ctx: Arc<ToolContext>,
    },
    Mcp {
        clients: Vec<Arc<Mutex<McpClient>>>,
        /// tool name → index into `clients`
        routes: HashMap<String, usize>,
        tools: Vec<ToolDescriptor>,
    },
}

impl ToolBackend {
    pub fn local(registry: ToolRegistry, ctx: ToolContext) -> Self {
        ToolBackend::Local {
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
        }
    }

    /// Launch every configured server and collect its tools. A tool name
    /// offered by two servers is an error.
    pub fn connect(config: &McpConfig) -> Result<Self> {
        let mut clients = Vec::new();
        let mut routes = HashMap::new();
        let mut tools = Vec::new();

        for (name, server) in &config.servers {
            let mut client = McpClient::spawn(name, server)?;
            let listed = client.list_tools()?;
            tracing::info!(server = %name, tools = listed.len(), "listed MCP tools");
            let idx = clients.len();
            for tool in listed {
                if routes.insert(tool.name.clone(), idx).is_some() {
                    bail!("tool '{}' is offered by more than one MCP server", tool.name);
                }
                tools.push(ToolDescriptor {
                    name: tool.name,
                    description: tool.description,
                    parameters: tool.input_schema,
                });
            }
            clients.push(Arc::new(Mutex::new(client)));
        }

        Ok(ToolBackend::Mcp {
            clients,
            routes,
            tools,
        })
    }

    pub fn tools(&self) -> Vec<ToolDescriptor> {
        match self {
            ToolBackend::Local { registry, .. } => registry
                .specs()
                .map(|spec| ToolDescriptor {
                    name: spec.name.to_string(),
                    description: spec.description.to_string(),
                    parameters: spec.input_schema(),
                })
                .collect(),
            ToolBackend::Mcp { tools, .. } => tools.clone(),
        }
    }

    /// Run one tool and return its text output.
    pub async fn call(&self, name: &str, args: Value) -> Result<String> {
        match self {
            ToolBackend::Local { registry, ctx } => {
                let out = registry
                    .clone()
                    .dispatch(ctx.clone(), name.to_string(), args)
                    .await?;
                Ok(out.to_string())
            }
            ToolBackend::Mcp {
                clients, routes, ..
            } => {
                let idx = *routes
                    .get(name)
                    .ok_or_else(|| anyhow!("unknown tool '{name}'"))?;
                let client = clients[idx].clone();
                let tool = name.to_string();
                let outcome = tokio::task::spawn_blocking(move || {
                    let mut guard = client
                        .lock()
                        .map_err(|_| anyhow!("MCP client lock poisoned"))?;
                    guard.call_tool(&tool, args)
                })
                .await
                .context("MCP call task failed")??;
                if outcome.is_error {
                    bail!(outcome.text);
                }
                Ok(outcome.text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seisproc::ToolConfig;
    use serde_json::json;

    #[test]
    fn test_local_backend_describes_registry() {
        let backend = ToolBackend::local(ToolRegistry::standard(), ToolContext::default());
        let tools = backend.tools();
        assert_eq!(tools.len(), ToolRegistry::standard().len());
        let plot = tools
            .iter()
            .find(|t| t.name == "mdio_plot_inline")
            .unwrap();
        assert_eq!(plot.parameters["type"], "object");
        assert!(plot.parameters["properties"].get("inline").is_some());
    }

    #[tokio::test]
    async fn test_local_backend_reports_unknown_tool() {
        let ctx = ToolContext::new(ToolConfig::default().with_output_dir(std::env::temp_dir()));
        let backend = ToolBackend::local(ToolRegistry::standard(), ctx);
        let err = backend.call("no_such_tool", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("no_such_tool"));
    }
}
