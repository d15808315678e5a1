use crate::mcp::schema::ParamSchema;
use crate::mcp::types::ToolOutput;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// Executes a tool once its arguments have passed schema validation.
#[async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    async fn call(&self, args: Value) -> anyhow::Result<ToolOutput>;
}

/// A named remote operation with its parameter schema and handler.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: ParamSchema,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParamSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    /// `tools/list` entry for this tool.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json_schema(),
        })
    }
}

/// Tool lookup table, built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Re-registering a name replaces the earlier
    /// definition in place, keeping its listing position.
    pub fn register(&mut self, tool: ToolDefinition) {
        tracing::debug!(name: "mcp.tool.registered", tool = %tool.name);
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    #[must_use]
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    pub fn descriptors(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDefinition::descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::schema::{ParamKind, ParamSpec};

    #[derive(Debug)]
    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, _args: Value) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text(self.0))
        }
    }

    fn echo(name: &str, reply: &'static str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            format!("echo {reply}"),
            ParamSchema::new().field(ParamSpec::required("x", ParamKind::String)),
            Arc::new(Echo(reply)),
        )
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", "first"));
        registry.register(echo("b", "other"));
        registry.register(echo("a", "second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);

        let out = registry
            .get("a")
            .unwrap()
            .handler
            .call(Value::Null)
            .await
            .unwrap();
        assert_eq!(out.text, "second");
    }

    #[test]
    fn test_descriptors_match_names() {
        let registry = ToolRegistry::new()
            .with_tool(echo("a", "1"))
            .with_tool(echo("b", "2"));
        let names: Vec<String> = registry
            .descriptors()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.descriptors()[0]["inputSchema"]["required"], json!(["x"]));
    }

    #[test]
    fn test_unknown_tool_lookup() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("nope").is_none());
    }
}
