//! Point-in-time snapshots of cluster resources.
//!
//! These are what the tools hand back to the agent: small, serializable
//! records carrying only the status-relevant fields.

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const NODE_ROLE_PREFIX: &str = "node-role.kubernetes.io/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub node: Option<String>,
    pub ready_containers: usize,
    pub total_containers: usize,
    pub restarts: i32,
    pub created: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
    pub created: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
}

impl DeploymentSummary {
    pub fn is_ready(&self) -> bool {
        self.ready_replicas >= self.replicas
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePortSummary {
    pub port: i32,
    pub target_port: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub cluster_ip: Option<String>,
    pub external_ip: Option<String>,
    pub ports: Vec<ServicePortSummary>,
    pub selector: BTreeMap<String, String>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub name: String,
    pub ready: bool,
    pub status: String,
    pub roles: Vec<String>,
    pub kubelet_version: Option<String>,
    pub os: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub conditions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSummary {
    pub name: String,
    pub phase: String,
    pub created: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub namespace: String,
    pub name: String,
    /// Involved object as `Kind/name`.
    pub object: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub source: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    pub count: i32,
}

impl EventRecord {
    /// Timestamp used for ordering: last seen, then first seen, then event
    /// time, then creation.
    pub fn seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen
            .or(self.first_seen)
            .or(self.event_time)
            .or(self.created)
    }
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

fn namespace_of(meta: &ObjectMeta) -> String {
    meta.namespace.clone().unwrap_or_default()
}

fn created_of(meta: &ObjectMeta) -> Option<DateTime<Utc>> {
    meta.creation_timestamp.as_ref().map(|t| t.0)
}

fn time_of(t: &Option<Time>) -> Option<DateTime<Utc>> {
    t.as_ref().map(|t| t.0)
}

impl From<&Pod> for PodSummary {
    fn from(pod: &Pod) -> Self {
        let statuses = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_deref())
            .unwrap_or_default();

        Self {
            name: name_of(&pod.metadata),
            namespace: namespace_of(&pod.metadata),
            phase: pod
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            node: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
            ready_containers: statuses.iter().filter(|c| c.ready).count(),
            total_containers: pod.spec.as_ref().map(|s| s.containers.len()).unwrap_or(0),
            restarts: statuses.iter().map(|c| c.restart_count).sum(),
            created: created_of(&pod.metadata),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

impl From<&Deployment> for DeploymentSummary {
    fn from(deployment: &Deployment) -> Self {
        let spec = deployment.spec.as_ref();
        let status = deployment.status.as_ref();

        Self {
            name: name_of(&deployment.metadata),
            namespace: namespace_of(&deployment.metadata),
            // The API server defaults an unset replica count to 1.
            replicas: spec.and_then(|s| s.replicas).unwrap_or(1),
            ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
            available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
            created: created_of(&deployment.metadata),
            labels: deployment.metadata.labels.clone().unwrap_or_default(),
            selector: spec
                .and_then(|s| s.selector.match_labels.clone())
                .unwrap_or_default(),
        }
    }
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        let spec = service.spec.as_ref();
        let external_ip = service
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .and_then(|ingress| ingress.first())
            .and_then(|i| i.ip.clone().or_else(|| i.hostname.clone()));

        Self {
            name: name_of(&service.metadata),
            namespace: namespace_of(&service.metadata),
            service_type: spec
                .and_then(|s| s.type_.clone())
                .unwrap_or_else(|| "ClusterIP".to_string()),
            cluster_ip: spec.and_then(|s| s.cluster_ip.clone()),
            external_ip,
            ports: spec
                .and_then(|s| s.ports.as_ref())
                .map(|ports| {
                    ports
                        .iter()
                        .map(|p| ServicePortSummary {
                            port: p.port,
                            target_port: p.target_port.as_ref().map(|t| match t {
                                IntOrString::Int(i) => i.to_string(),
                                IntOrString::String(s) => s.clone(),
                            }),
                            protocol: p.protocol.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
            created: created_of(&service.metadata),
        }
    }
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        let conditions: BTreeMap<String, String> = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| {
                conds
                    .iter()
                    .map(|c| (c.type_.clone(), c.status.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let ready = conditions.get("Ready").map(|s| s == "True").unwrap_or(false);
        let node_info = node.status.as_ref().and_then(|s| s.node_info.as_ref());

        Self {
            name: name_of(&node.metadata),
            ready,
            status: if ready { "Ready" } else { "NotReady" }.to_string(),
            roles: node
                .metadata
                .labels
                .as_ref()
                .map(|labels| {
                    labels
                        .keys()
                        .filter_map(|k| k.strip_prefix(NODE_ROLE_PREFIX))
                        .filter(|role| !role.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            kubelet_version: node_info.map(|i| i.kubelet_version.clone()),
            os: node_info.map(|i| i.operating_system.clone()),
            created: created_of(&node.metadata),
            conditions,
        }
    }
}

impl From<&Namespace> for NamespaceSummary {
    fn from(namespace: &Namespace) -> Self {
        Self {
            name: name_of(&namespace.metadata),
            phase: namespace
                .status
                .as_ref()
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            created: created_of(&namespace.metadata),
            labels: namespace.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let involved = &event.involved_object;
        let object = format!(
            "{}/{}",
            involved.kind.as_deref().unwrap_or("Unknown"),
            involved.name.as_deref().unwrap_or("<unknown>")
        );
        Self {
            namespace: namespace_of(&event.metadata),
            name: name_of(&event.metadata),
            object,
            reason: event.reason.clone(),
            message: event.message.clone(),
            event_type: event.type_.clone(),
            source: event.source.as_ref().and_then(|s| s.component.clone()),
            first_seen: time_of(&event.first_timestamp),
            last_seen: time_of(&event.last_timestamp),
            event_time: event.event_time.as_ref().map(|t| t.0),
            created: created_of(&event.metadata),
            count: event.count.unwrap_or(1),
        }
    }
}
