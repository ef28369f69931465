//! Exposes registered cluster tools through Rig's `Tool` trait.

use rig::completion::ToolDefinition;
use rig::tool::Tool as RigTool;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{ClusterTool, ToolError, ToolRegistry, ToolResult};

/// One registry entry as seen by the Rig agent.
#[derive(Clone)]
pub struct AgentTool {
    tool: ClusterTool,
    registry: Arc<ToolRegistry>,
}

impl AgentTool {
    pub fn new(tool: ClusterTool, registry: Arc<ToolRegistry>) -> Self {
        Self { tool, registry }
    }

    /// Every tool in the registry, ready to hand to an agent builder.
    pub fn all(registry: &Arc<ToolRegistry>) -> Vec<AgentTool> {
        registry
            .tools()
            .map(|tool| AgentTool::new(tool, registry.clone()))
            .collect()
    }
}

impl RigTool for AgentTool {
    const NAME: &'static str = "cluster_query";

    type Error = ToolError;
    type Args = Value;
    type Output = ToolResult;

    // Rig keys its tool set by this, so each registry entry needs its own name.
    fn name(&self) -> String {
        self.tool.name().to_string()
    }

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        self.tool.definition()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let name = self.tool.name();
        info!("Agent called {} with {}", name, args);

        // Spawn the execution to avoid Sync issues with kube client
        let registry = self.registry.clone();
        let outcome = tokio::spawn(async move { registry.invoke(name, args).await })
            .await
            .map_err(|e| ToolError::InternalError(format!("{} task failed: {}", name, e)))?;

        Ok(ToolResult::from(outcome))
    }
}
