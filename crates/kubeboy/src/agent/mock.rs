//! Offline chat agent.
//!
//! Picks a tool from keywords in the message instead of asking a model.
//! Useful for demos without an API key and for end-to-end tests.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::behavior::ChatAgent;
use super::tools::{ClusterTool, ToolRegistry};
use crate::Result;

pub struct MockChatbot {
    registry: Arc<ToolRegistry>,
}

fn namespace_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"\b(?:in|from)\s+(?:the\s+)?([a-z0-9][a-z0-9-]*)\s+namespace\b").unwrap(),
            Regex::new(r"\bnamespace\s+([a-z0-9][a-z0-9-]*)").unwrap(),
            Regex::new(r"(?:^|\s)-n\s+([a-z0-9][a-z0-9-]*)").unwrap(),
        ]
    })
}

impl MockChatbot {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Choose a tool and its arguments for `message`, if any tool fits.
    pub fn route(message: &str) -> Option<(ClusterTool, Value)> {
        let text = message.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        let tool = if has(&["summary", "overview", "health", "status of the cluster"]) {
            ClusterTool::ClusterSummary
        } else if has(&["event"]) {
            ClusterTool::Events
        } else if has(&["deployment"]) {
            ClusterTool::Deployments
        } else if has(&["service", "svc"]) {
            ClusterTool::Services
        } else if has(&["pod"]) {
            ClusterTool::Pods
        } else if has(&["node"]) {
            ClusterTool::Nodes
        } else if has(&["namespace"]) {
            ClusterTool::Namespaces
        } else {
            return None;
        };

        let args = match tool {
            ClusterTool::Pods | ClusterTool::Deployments | ClusterTool::Services | ClusterTool::Events => {
                match extract_namespace(&text) {
                    Some(ns) => json!({ "namespace": ns }),
                    None => json!({}),
                }
            }
            _ => json!({}),
        };

        Some((tool, args))
    }
}

fn extract_namespace(text: &str) -> Option<String> {
    namespace_patterns()
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl ChatAgent for MockChatbot {
    async fn respond(&self, message: &str) -> Result<String> {
        let Some((tool, args)) = Self::route(message) else {
            return Ok(format!(
                "I received your message: '{}'. However, I'm running in mock mode and can only \
                 answer questions about pods, deployments, services, nodes, namespaces, events \
                 or the cluster summary.",
                message
            ));
        };

        debug!("Mock chatbot routed message to {}", tool.name());
        match self.registry.invoke(tool.name(), args).await {
            Ok(output) => Ok(format!(
                "Here is what {} returned:\n{}",
                tool.name(),
                serde_json::to_string_pretty(&output)?
            )),
            Err(e) => Ok(format!("The {} query failed: {}", tool.name(), e)),
        }
    }

    fn behavior_type(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_summary() {
        let (tool, args) = MockChatbot::route("Give me a cluster summary").unwrap();
        assert_eq!(tool, ClusterTool::ClusterSummary);
        assert_eq!(args, json!({}));
    }

    #[test]
    fn test_routes_namespaced_queries() {
        let (tool, args) =
            MockChatbot::route("What deployments are running in the default namespace?").unwrap();
        assert_eq!(tool, ClusterTool::Deployments);
        assert_eq!(args, json!({ "namespace": "default" }));

        let (tool, args) = MockChatbot::route("Show me services in the kube-system namespace").unwrap();
        assert_eq!(tool, ClusterTool::Services);
        assert_eq!(args, json!({ "namespace": "kube-system" }));

        let (_, args) = MockChatbot::route("list pods -n monitoring").unwrap();
        assert_eq!(args, json!({ "namespace": "monitoring" }));
    }

    #[test]
    fn test_routes_cluster_scoped() {
        assert_eq!(MockChatbot::route("List all namespaces").unwrap().0, ClusterTool::Namespaces);
        assert_eq!(
            MockChatbot::route("What nodes do I have and what's their status?").unwrap().0,
            ClusterTool::Nodes
        );
        assert_eq!(MockChatbot::route("Show me recent events").unwrap().0, ClusterTool::Events);
    }

    #[test]
    fn test_unrelated_message_has_no_route() {
        assert!(MockChatbot::route("tell me a joke").is_none());
    }
}
