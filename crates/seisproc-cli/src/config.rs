//! Chat settings: LLM provider from the environment and MCP server launch
//! configs in the `{"mcpServers": {...}}` layout.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Which OpenAI-compatible endpoint to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => bail!("unknown LLM_PROVIDER '{other}' (expected 'openai' or 'ollama')"),
        }
    }
}

/// Resolved chat-completions endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmSettings {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmSettings {
    /// Read `LLM_PROVIDER` (default `openai`), `MODEL_NAME` and the
    /// provider's endpoint variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LlmSettings::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("LLM_PROVIDER") {
            Some(v) => Provider::parse(&v)?,
            None => Provider::OpenAi,
        };
        let model = non_empty("MODEL_NAME").context("MODEL_NAME is not set")?;

        let settings = match provider {
            Provider::OpenAi => LlmSettings {
                provider,
                base_url: non_empty("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                api_key: non_empty("OPENAI_API_KEY"),
                model,
                temperature: None,
                max_tokens: None,
            },
            Provider::Ollama => {
                let host = non_empty("OLLAMA_HOST")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
                LlmSettings {
                    provider,
                    base_url: format!("{}/v1", host.trim_end_matches('/')),
                    api_key: None,
                    model,
                    temperature: Some(0.8),
                    max_tokens: Some(4096),
                }
            }
        };
        Ok(settings)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// One MCP server to launch over stdio.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct McpServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers")]
    pub servers: BTreeMap<String, McpServerConfig>,
}

impl McpConfig {
    pub fn parse(text: &str) -> Result<Self> {
        let config: McpConfig =
            serde_json::from_str(text).context("invalid MCP server config")?;
        if config.servers.is_empty() {
            bail!("MCP server config lists no servers");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_openai_defaults() {
        let s = LlmSettings::from_lookup(lookup(&[("MODEL_NAME", "gpt-4o")])).unwrap();
        assert_eq!(s.provider, Provider::OpenAi);
        assert_eq!(s.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(s.completions_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(s.temperature, None);
    }

    #[test]
    fn test_ollama_uses_v1_suffix_and_sampling_defaults() {
        let s = LlmSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "Ollama"),
            ("MODEL_NAME", "qwen2.5"),
            ("OLLAMA_HOST", "http://gpu-box:11434/"),
        ]))
        .unwrap();
        assert_eq!(s.base_url, "http://gpu-box:11434/v1");
        assert_eq!(s.temperature, Some(0.8));
        assert_eq!(s.max_tokens, Some(4096));
        assert!(s.api_key.is_none());
    }

    #[test]
    fn test_missing_model_or_bad_provider_fails() {
        assert!(LlmSettings::from_lookup(lookup(&[])).is_err());
        assert!(LlmSettings::from_lookup(lookup(&[
            ("LLM_PROVIDER", "anthropic"),
            ("MODEL_NAME", "x")
        ]))
        .is_err());
    }

    #[test]
    fn test_parse_mcp_servers() {
        let cfg = McpConfig::parse(
            r#"{"mcpServers": {"seismic": {"command": "seisproc-mcp",
                "args": ["--output-dir", "/tmp/figs"], "env": {"RUST_LOG": "warn"}}}}"#,
        )
        .unwrap();
        let server = &cfg.servers["seismic"];
        assert_eq!(server.command, "seisproc-mcp");
        assert_eq!(server.args, vec!["--output-dir", "/tmp/figs"]);
        assert_eq!(server.env["RUST_LOG"], "warn");

        assert!(McpConfig::parse(r#"{"mcpServers": {}}"#).is_err());
        assert!(McpConfig::parse(r#"{"servers": {}}"#).is_err());
    }
}
