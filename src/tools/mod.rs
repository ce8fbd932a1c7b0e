//! MCP tools: a registry of named async handlers and the built-in tool set.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::KeywordError;
use crate::router::McpState;
use crate::types::mcp::ToolMetadata;

pub mod content;
pub mod discovery;
pub mod images;
pub mod keywords;
pub mod strategy;

pub type ToolFuture = BoxFuture<'static, Result<Value, KeywordError>>;
pub type ToolHandler = Arc<dyn Fn(McpState, Value) -> ToolFuture + Send + Sync>;

pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    handler: ToolHandler,
}

impl Tool {
    pub fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Run the handler; `null` arguments are treated as an empty object.
    pub fn call(&self, state: McpState, arguments: Option<Value>) -> ToolFuture {
        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(v) => v,
        };
        (self.handler)(state, args)
    }
}

/// Tools in registration order, which is also `tools/list` order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler taking typed arguments. Arguments that do not
    /// deserialize into `A` fail with `InvalidArguments` before `f` runs.
    pub fn register<A, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        f: F,
    ) -> &mut Self
    where
        A: DeserializeOwned + Send + 'static,
        F: Fn(McpState, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, KeywordError>> + Send + 'static,
    {
        let f = Arc::new(f);
        let handler: ToolHandler = Arc::new(move |state, raw| {
            let f = f.clone();
            Box::pin(async move {
                let args: A = serde_json::from_value(raw)
                    .map_err(|e| KeywordError::InvalidArguments(e.to_string()))?;
                f(state, args).await
            })
        });
        self.tools.push(Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn metadata(&self) -> Vec<ToolMetadata> {
        self.tools.iter().map(Tool::metadata).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// JSON Schema for an object taking `properties`, of which `required` are mandatory.
pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    keywords::register(&mut registry);
    content::register(&mut registry);
    images::register(&mut registry);
    discovery::register(&mut registry);
    strategy::register(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_registry_names_are_unique() {
        let registry = default_registry();
        let names: HashSet<_> = registry.metadata().into_iter().map(|m| m.name).collect();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn default_registry_order() {
        let names: Vec<_> = default_registry()
            .metadata()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("get_search_volume"));
        assert_eq!(names.last().map(String::as_str), Some("editStrategyAppendixB"));
        assert!(names.iter().any(|n| n == "generate_image"));
        assert!(names.iter().any(|n| n == "update_discovery_document"));
        // 5 keyword, 5 content, 1 image, 2 discovery, 3 + 17 strategy
        assert_eq!(names.len(), 33);
    }

    #[test]
    fn every_schema_is_an_object() {
        for meta in default_registry().metadata() {
            assert_eq!(meta.input_schema["type"], "object", "{}", meta.name);
            assert!(meta.input_schema["properties"].is_object(), "{}", meta.name);
        }
    }
}
