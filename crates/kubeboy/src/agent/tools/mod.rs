//! Agent Tools Module
//!
//! Registers the read-only cluster queries as tools the agent can call.

pub mod adapter;
pub mod cluster;

pub use adapter::AgentTool;
pub use cluster::{ClusterTool, ToolArgs};

use rig::completion::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::kubernetes::ClusterQueries;
use crate::{Error, Result};

/// Result handed back to the model after a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: String,
    pub message: String,
}

impl From<Result<Value>> for ToolResult {
    fn from(outcome: Result<Value>) -> Self {
        match outcome {
            Ok(output) => ToolResult {
                success: true,
                output: Some(output),
                error: None,
            },
            Err(e) => ToolResult {
                success: false,
                output: None,
                error: Some(ToolFailure {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Name-to-tool mapping, fixed at construction.
pub struct ToolRegistry {
    queries: ClusterQueries,
    tools: BTreeMap<&'static str, ClusterTool>,
}

impl ToolRegistry {
    pub fn new(queries: ClusterQueries) -> Self {
        let tools = ClusterTool::ALL
            .into_iter()
            .map(|tool| (tool.name(), tool))
            .collect();
        Self { queries, tools }
    }

    pub fn get(&self, name: &str) -> Option<ClusterTool> {
        self.tools.get(name).copied()
    }

    pub fn tools(&self) -> impl Iterator<Item = ClusterTool> + '_ {
        self.tools.values().copied()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools().map(|tool| tool.definition()).collect()
    }

    /// Validate `args` and run the named tool.
    ///
    /// Argument errors are reported before any call reaches the cluster;
    /// query errors come back unchanged.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown tool '{}'", name)))?;
        let args = tool.validate(args).map_err(|e| {
            warn!("Rejected arguments for {}: {}", name, e);
            e
        })?;
        debug!("Invoking {} with {:?}", name, args);
        tool.invoke(&self.queries, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::kubernetes::fixtures::{failed_pod, node, pod, FixtureCluster};
    use serde_json::json;
    use std::sync::Arc;

    fn registry(cluster: Arc<FixtureCluster>) -> ToolRegistry {
        ToolRegistry::new(ClusterQueries::new(cluster, QueryConfig::default()))
    }

    #[test]
    fn test_registry_has_all_tools() {
        let registry = registry(Arc::new(FixtureCluster::default()));
        let names: Vec<&str> = registry.tools().map(|t| t.name()).collect();
        assert_eq!(names.len(), 7);
        assert!(registry.get("get_cluster_summary").is_some());
        assert!(registry.get("delete_pod").is_none());
    }

    #[tokio::test]
    async fn test_invalid_args_never_reach_cluster() {
        let cluster = Arc::new(FixtureCluster::default().with_pods(vec![pod("default", "a")]));
        let registry = registry(cluster.clone());

        let err = registry
            .invoke("get_pods", json!({ "namespace": 7 }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(cluster.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_argument() {
        let cluster = Arc::new(FixtureCluster::default());
        let err = registry(cluster.clone())
            .invoke("scale_deployment", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(cluster.calls(), 0);
    }

    #[tokio::test]
    async fn test_invoke_pods_in_namespace() {
        let cluster = Arc::new(
            FixtureCluster::default()
                .with_pods(vec![pod("default", "a"), pod("kube-system", "coredns")]),
        );
        let value = registry(cluster)
            .invoke("get_pods", json!({ "namespace": "kube-system" }))
            .await
            .unwrap();
        let pods = value.as_array().unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0]["name"], "coredns");
    }

    #[tokio::test]
    async fn test_cluster_summary_tool() {
        let cluster = Arc::new(
            FixtureCluster::default()
                .with_nodes(vec![node("n1", true), node("n2", true), node("n3", false)])
                .with_namespaces(&["default", "kube-system"])
                .with_pods(vec![
                    pod("default", "a"),
                    pod("default", "b"),
                    pod("default", "c"),
                    failed_pod("default", "d"),
                ]),
        );
        let value = registry(cluster)
            .invoke("get_cluster_summary", Value::Null)
            .await
            .unwrap();
        assert_eq!(value["nodes"]["ready"], 2);
        assert_eq!(value["nodes"]["not_ready"], 1);
        assert_eq!(value["namespaces"]["active"], 2);
        assert_eq!(value["unhealthy_pods"].as_array().unwrap().len(), 1);
        assert_eq!(value["unhealthy_pods"][0]["name"], "d");
    }

    #[tokio::test]
    async fn test_query_errors_propagate_unchanged() {
        let cluster = Arc::new(FixtureCluster::default().failing_nodes());
        let err = registry(cluster).invoke("get_nodes", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::ClusterUnreachable(_)));
    }

    #[test]
    fn test_tool_result_from_error() {
        let outcome: Result<Value> = Err(Error::ResourceNotFound("namespace nope".to_string()));
        let result = ToolResult::from(outcome);
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "resource_not_found");
    }
}
