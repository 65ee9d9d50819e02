/*!
Explicit tool registry.

Each entry pairs a [`ToolSpec`] (name, description, parameter metadata) with a
handler that decodes the JSON arguments into its typed parameter struct. The
registry is built once, is immutable afterwards and is shared by reference
between the MCP server, the chat agent and the CLI.
*/

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{basic, denoising, ToolContext, ToolOutput};
use crate::error::{Error, Result};

/// JSON type of a tool parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    /// Two integers, e.g. a filter window `[rows, cols]`.
    IntegerPair,
}

impl ParamKind {
    fn schema(self) -> Value {
        match self {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::Number => json!({ "type": "number" }),
            ParamKind::IntegerPair => json!({
                "type": "array",
                "items": { "type": "integer", "minimum": 1 },
                "minItems": 2,
                "maxItems": 2
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// `None` marks a required parameter.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        ParamSpec {
            name,
            kind,
            description,
            default: None,
        }
    }

    pub fn optional(
        name: &'static str,
        kind: ParamKind,
        description: &'static str,
        default: Value,
    ) -> Self {
        ParamSpec {
            name,
            kind,
            description,
            default: Some(default),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    /// JSON Schema object describing the arguments, as used for function calling.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut schema = p.kind.schema();
            if let Value::Object(obj) = &mut schema {
                obj.insert("description".into(), Value::from(p.description));
                if let Some(default) = &p.default {
                    if !default.is_null() {
                        obj.insert("default".into(), default.clone());
                    }
                }
            }
            properties.insert(p.name.to_string(), schema);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name)
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

type Handler = Box<dyn Fn(&ToolContext, Value) -> Result<ToolOutput> + Send + Sync>;

struct Entry {
    spec: ToolSpec,
    handler: Handler,
}

/// Name → handler table.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in tool.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        basic::register(&mut registry);
        denoising::register(&mut registry);
        registry
    }

    /// Add a tool whose arguments decode into `P`. A tool with the same name is replaced.
    pub fn register<P, F>(&mut self, spec: ToolSpec, handler: F)
    where
        P: DeserializeOwned + 'static,
        F: Fn(&ToolContext, P) -> Result<ToolOutput> + Send + Sync + 'static,
    {
        let tool = spec.name;
        let handler: Handler = Box::new(move |ctx: &ToolContext, args: Value| {
            let args = match args {
                Value::Null => Value::Object(Map::new()),
                other => other,
            };
            let params: P = serde_json::from_value(args)
                .map_err(|e| Error::invalid(format!("bad arguments for {tool}: {e}")))?;
            handler(ctx, params)
        });

        if let Some(existing) = self.entries.iter_mut().find(|e| e.spec.name == spec.name) {
            tracing::warn!(tool = spec.name, "replacing registered tool");
            existing.spec = spec;
            existing.handler = handler;
        } else {
            self.entries.push(Entry { spec, handler });
        }
    }

    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.spec.name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.entries
            .iter()
            .find(|e| e.spec.name == name)
            .map(|e| &e.spec)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `name` with JSON `args` on the current thread.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for an unknown tool or arguments that do not
    /// decode; otherwise whatever the tool itself returns.
    pub fn call(&self, ctx: &ToolContext, name: &str, args: Value) -> Result<ToolOutput> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.spec.name == name)
            .ok_or_else(|| Error::invalid(format!("unknown tool '{name}'")))?;

        let started = Instant::now();
        tracing::info!(tool = name, "tool call");
        let result = (entry.handler)(ctx, args);
        match &result {
            Ok(out) => tracing::info!(
                tool = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                image = ?out.image,
                "tool finished"
            ),
            Err(err) => tracing::warn!(tool = name, error = %err, "tool failed"),
        }
        result
    }

    /// [`ToolRegistry::call`] on tokio's blocking pool.
    pub async fn dispatch(
        self: Arc<Self>,
        ctx: Arc<ToolContext>,
        name: String,
        args: Value,
    ) -> Result<ToolOutput> {
        let label = name.clone();
        tokio::task::spawn_blocking(move || self.call(&ctx, &name, args))
            .await
            .map_err(|e| {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                tracing::error!(tool = %label, %reason, "tool task failed");
                Error::Internal(format!("tool '{label}' did not complete: {reason}"))
            })?
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "panicked".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;

    #[test]
    fn standard_registry_lists_every_tool_once() {
        let reg = ToolRegistry::standard();
        let mut names: Vec<&str> = reg.names().collect();
        assert_eq!(names.len(), 11);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 11);
        for name in [
            "overview",
            "frequency_spectrum_2d",
            "frequency_spectrum_3d",
            "segy2mdio",
            "mdio2segy",
            "mdio_plot_inline",
            "mdio_plot_crossline",
            "mdio_plot_time",
            "denoise_svd_with_cutoff",
            "denoise_median",
            "denoise_gaussian",
        ] {
            assert!(reg.get(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn schema_marks_required_and_defaults() {
        let reg = ToolRegistry::standard();
        let schema = reg.get("denoise_svd_with_cutoff").unwrap().input_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"line_type"));
        assert!(!required.contains(&"cutoff_ratio"));
        assert_eq!(schema["properties"]["cutoff_ratio"]["default"], json!(0.5));
        assert_eq!(schema["properties"]["line_number"]["type"], "integer");
    }

    #[test]
    fn unknown_tool_and_bad_args_are_invalid_input() {
        let reg = ToolRegistry::standard();
        let ctx = ToolContext::new(ToolConfig::default());
        assert!(matches!(
            reg.call(&ctx, "no_such_tool", Value::Null),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            reg.call(&ctx, "overview", json!({ "data_path": 3 })),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn panicking_tool_is_reported_as_internal_error() {
        let mut reg = ToolRegistry::new();
        reg.register(
            ToolSpec {
                name: "explode",
                description: "always panics",
                params: Vec::new(),
            },
            |_ctx: &ToolContext, _p: Value| -> Result<ToolOutput> { panic!("boom at sample 7") },
        );
        let err = Arc::new(reg)
            .dispatch(
                Arc::new(ToolContext::default()),
                "explode".to_string(),
                json!({}),
            )
            .await
            .unwrap_err();
        match err {
            Error::Internal(msg) => {
                assert!(msg.contains("explode"));
                assert!(msg.contains("boom at sample 7"));
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}
