//! Tool-calling agent: conversation memory plus a bounded LLM/tool loop.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use crate::backend::{ToolBackend, ToolDescriptor};
use crate::llm::{ChatMessage, ChatModel, ToolCall};

pub const DEFAULT_MAX_STEPS: usize = 30;

const SYSTEM_PROMPT: &str = "You are SeismicProcAgent, an assistant for seismic data processing. \
Use the provided tools to inspect SEG-Y files, convert them to the chunked store, plot sections \
and time slices, compute amplitude spectra and apply denoising filters. Tools that draw figures \
return the path of the written image; report it to the user. Ask for the data directory and file \
name when they are missing.";

pub struct Agent {
    model: Arc<dyn ChatModel>,
    backend: Arc<ToolBackend>,
    tools: Vec<ToolDescriptor>,
    history: Vec<ChatMessage>,
    max_steps: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, backend: Arc<ToolBackend>, max_steps: usize) -> Self {
        let tools = backend.tools();
        Agent {
            model,
            backend,
            tools,
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            max_steps: max_steps.max(1),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Answer `query`, running tools as the model asks for them.
    ///
    /// A failed run leaves the conversation as it was before the query.
    pub async fn run(&mut self, query: &str) -> Result<String> {
        let checkpoint = self.history.len();
        let result = self.run_steps(query).await;
        if result.is_err() {
            self.history.truncate(checkpoint);
        }
        result
    }

    async fn run_steps(&mut self, query: &str) -> Result<String> {
        self.history.push(ChatMessage::user(query));

        for step in 1..=self.max_steps {
            let reply = self.complete().await?;
            let calls: Vec<ToolCall> = reply.requested_calls().to_vec();
            self.history.push(reply);

            if calls.is_empty() {
                let answer = self
                    .history
                    .last()
                    .and_then(|m| m.content.clone())
                    .unwrap_or_default();
                tracing::debug!(step, "agent answered");
                return Ok(answer);
            }

            for call in calls {
                let text = self.execute(&call).await;
                self.history.push(ChatMessage::tool(call.id, text));
            }
        }
        bail!("no final answer after {} steps", self.max_steps)
    }

    async fn complete(&self) -> Result<ChatMessage> {
        let model = self.model.clone();
        let messages = self.history.clone();
        let tools = self.tools.clone();
        tokio::task::spawn_blocking(move || model.complete(&messages, &tools))
            .await
            .context("LLM request task failed")?
    }

    /// Run one tool call. Failures become the tool's reply so the model can
    /// react to them.
    async fn execute(&self, call: &ToolCall) -> String {
        let name = &call.function.name;
        let args = match parse_arguments(&call.function.arguments) {
            Ok(v) => v,
            Err(e) => return format!("Error: {e}"),
        };
        tracing::info!(tool = %name, "agent tool call");
        match self.backend.call(name, args).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "agent tool call failed");
                format!("Error: {e:#}")
            }
        }
    }
}

/// Decode the model's argument string; an empty string means no arguments.
pub fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value =
        serde_json::from_str(raw).map_err(|e| anyhow!("tool arguments are not valid JSON: {e}"))?;
    if !value.is_object() {
        bail!("tool arguments must be a JSON object");
    }
    Ok(value)
}
