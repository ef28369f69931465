//! The fixed set of cluster query tools.
//!
//! Each variant knows its name, description and parameter schema, validates
//! raw JSON arguments, and dispatches to the matching query function.

use regex::Regex;
use rig::completion::ToolDefinition;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::kubernetes::ClusterQueries;
use crate::{Error, Result};

pub const MAX_EVENT_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterTool {
    Pods,
    Deployments,
    Services,
    Nodes,
    Namespaces,
    Events,
    ClusterSummary,
}

/// Arguments after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    pub namespace: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamespaceArgs {
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventArgs {
    namespace: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn namespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // RFC 1123 label, as enforced by the API server for namespace names.
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap())
}

fn check_namespace(namespace: Option<String>) -> Result<Option<String>> {
    match namespace {
        None => Ok(None),
        Some(ns) if ns.trim().is_empty() => Ok(None),
        Some(ns) => {
            if ns.len() > 63 || !namespace_pattern().is_match(&ns) {
                return Err(Error::InvalidArgument(format!(
                    "'{}' is not a valid namespace name",
                    ns
                )));
            }
            Ok(Some(ns))
        }
    }
}

impl ClusterTool {
    pub const ALL: [ClusterTool; 7] = [
        ClusterTool::Pods,
        ClusterTool::Deployments,
        ClusterTool::Services,
        ClusterTool::Nodes,
        ClusterTool::Namespaces,
        ClusterTool::Events,
        ClusterTool::ClusterSummary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClusterTool::Pods => "get_pods",
            ClusterTool::Deployments => "get_deployments",
            ClusterTool::Services => "get_services",
            ClusterTool::Nodes => "get_nodes",
            ClusterTool::Namespaces => "get_namespaces",
            ClusterTool::Events => "get_events",
            ClusterTool::ClusterSummary => "get_cluster_summary",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ClusterTool::Pods => {
                "Get information about pods in the Kubernetes cluster: name, namespace, phase, \
                 node, ready containers and restart count. Omit namespace to list pods in all namespaces."
            }
            ClusterTool::Deployments => {
                "Get information about deployments: desired, ready and available replicas, \
                 labels and selector. Omit namespace to list deployments in all namespaces."
            }
            ClusterTool::Services => {
                "Get information about services: type, cluster IP, external IP, ports and selector. \
                 Omit namespace to list services in all namespaces."
            }
            ClusterTool::Nodes => {
                "Get information about nodes: readiness, roles, kubelet version, operating system \
                 and conditions."
            }
            ClusterTool::Namespaces => "Get the namespaces in the cluster with their phase and labels.",
            ClusterTool::Events => {
                "Get recent cluster events, most recent first, with reason, message, involved \
                 object, timestamps and count. Useful for troubleshooting."
            }
            ClusterTool::ClusterSummary => {
                "Get a high-level health summary of the cluster: node readiness, pod counts by \
                 phase, namespace, deployment and service counts, and a list of unhealthy pods."
            }
        }
    }

    /// JSON schema for the tool's arguments.
    pub fn parameters(&self) -> Value {
        let namespace = json!({
            "type": "string",
            "description": "Namespace to filter by. Omit to query all namespaces."
        });

        match self {
            ClusterTool::Pods | ClusterTool::Deployments | ClusterTool::Services => json!({
                "type": "object",
                "properties": { "namespace": namespace },
                "required": []
            }),
            ClusterTool::Events => json!({
                "type": "object",
                "properties": {
                    "namespace": namespace,
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_EVENT_LIMIT,
                        "description": "Maximum number of events to return."
                    }
                },
                "required": []
            }),
            ClusterTool::Nodes | ClusterTool::Namespaces | ClusterTool::ClusterSummary => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    /// Check raw arguments against this tool's schema.
    ///
    /// `null` is accepted as "no arguments".
    pub fn validate(&self, args: Value) -> Result<ToolArgs> {
        let args = match args {
            Value::Null => json!({}),
            Value::Object(_) => args,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "{} expects an object of arguments, got {}",
                    self.name(),
                    other
                )))
            }
        };
        let invalid = |e: serde_json::Error| {
            Error::InvalidArgument(format!("{}: {}", self.name(), e))
        };

        match self {
            ClusterTool::Pods | ClusterTool::Deployments | ClusterTool::Services => {
                let parsed: NamespaceArgs = serde_json::from_value(args).map_err(invalid)?;
                Ok(ToolArgs {
                    namespace: check_namespace(parsed.namespace)?,
                    limit: None,
                })
            }
            ClusterTool::Events => {
                let parsed: EventArgs = serde_json::from_value(args).map_err(invalid)?;
                if let Some(limit) = parsed.limit {
                    if limit == 0 || limit > MAX_EVENT_LIMIT {
                        return Err(Error::InvalidArgument(format!(
                            "limit must be between 1 and {}, got {}",
                            MAX_EVENT_LIMIT, limit
                        )));
                    }
                }
                Ok(ToolArgs {
                    namespace: check_namespace(parsed.namespace)?,
                    limit: parsed.limit.map(|l| l as usize),
                })
            }
            ClusterTool::Nodes | ClusterTool::Namespaces | ClusterTool::ClusterSummary => {
                let _: NoArgs = serde_json::from_value(args).map_err(invalid)?;
                Ok(ToolArgs::default())
            }
        }
    }

    /// Run the underlying query with validated arguments.
    pub async fn invoke(&self, queries: &ClusterQueries, args: ToolArgs) -> Result<Value> {
        let namespace = args.namespace.as_deref();
        let value = match self {
            ClusterTool::Pods => serde_json::to_value(queries.list_pods(namespace).await?)?,
            ClusterTool::Deployments => {
                serde_json::to_value(queries.list_deployments(namespace).await?)?
            }
            ClusterTool::Services => serde_json::to_value(queries.list_services(namespace).await?)?,
            ClusterTool::Nodes => serde_json::to_value(queries.list_nodes().await?)?,
            ClusterTool::Namespaces => serde_json::to_value(queries.list_namespaces().await?)?,
            ClusterTool::Events => {
                serde_json::to_value(queries.list_events(namespace, args.limit).await?)?
            }
            ClusterTool::ClusterSummary => serde_json::to_value(queries.cluster_summary().await?)?,
        };
        Ok(value)
    }
}
