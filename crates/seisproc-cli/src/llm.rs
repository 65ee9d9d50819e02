//! OpenAI-compatible chat-completions client with function calling.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::ToolDescriptor;
use crate::config::LlmSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: &str, content: impl Into<String>) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage {
            tool_call_id: Some(call_id.into()),
            ..Self::plain("tool", content)
        }
    }

    /// Tool calls requested by an assistant message, if any.
    pub fn requested_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// One blocking completion round trip.
pub trait ChatModel: Send + Sync {
    fn complete(&self, messages: &[ChatMessage], tools: &[ToolDescriptor]) -> Result<ChatMessage>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct OpenAiClient {
    settings: LlmSettings,
    agent: ureq::Agent,
}

impl OpenAiClient {
    pub fn new(settings: LlmSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(300))
            .build();
        OpenAiClient { settings, agent }
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolDescriptor]) -> Value {
        let mut body = json!({
            "model": self.settings.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(function_definition).collect());
        }
        if let Some(t) = self.settings.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = self.settings.max_tokens {
            body["max_tokens"] = json!(m);
        }
        body
    }
}

/// `{"type": "function", "function": {...}}` entry of the `tools` array.
pub fn function_definition(tool: &ToolDescriptor) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

impl ChatModel for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage], tools: &[ToolDescriptor]) -> Result<ChatMessage> {
        let url = self.settings.completions_url();
        let mut request = self.agent.post(&url);
        if let Some(key) = &self.settings.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        tracing::debug!(url = %url, messages = messages.len(), "chat completion request");
        let response = match request.send_json(self.request_body(messages, tools)) {
            Ok(r) => r,
            Err(ureq::Error::Status(code, r)) => {
                let detail = r.into_string().unwrap_or_default();
                return Err(anyhow!("{url} returned HTTP {code}: {detail}"));
            }
            Err(e) => return Err(anyhow!(e).context(format!("request to {url} failed"))),
        };
        let parsed: CompletionResponse = response
            .into_json()
            .context("chat completion response is not valid JSON")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmSettings, Provider};

    #[test]
    fn test_tool_message_shape() {
        let msg = ChatMessage::tool("call_1", "done");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "call_1");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn test_parse_assistant_tool_call() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null,
            "tool_calls":[{"id":"c1","type":"function","function":
            {"name":"overview","arguments":"{\"data_path\":\"/d\",\"data\":\"a.sgy\"}"}}]}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        let msg = &parsed.choices[0].message;
        assert_eq!(msg.requested_calls().len(), 1);
        assert_eq!(msg.requested_calls()[0].function.name, "overview");
        assert!(msg.content.is_none());
    }

    #[test]
    fn test_request_body_includes_sampling_for_ollama() {
        let client = OpenAiClient::new(LlmSettings {
            provider: Provider::Ollama,
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            model: "llama3".into(),
            temperature: Some(0.8),
            max_tokens: Some(4096),
        });
        let tool = ToolDescriptor {
            name: "overview".into(),
            description: "Summarise a SEG-Y file".into(),
            parameters: json!({"type": "object"}),
        };
        let body = client.request_body(&[ChatMessage::user("hi")], &[tool]);
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["tools"][0]["function"]["name"], "overview");
    }
}
