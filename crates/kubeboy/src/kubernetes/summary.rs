//! Cluster summary aggregation.
//!
//! `summarize` is a pure function of the snapshots it is given, the query
//! configuration and a reference time, so identical cluster state always
//! yields an identical summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resources::{
    DeploymentSummary, NamespaceSummary, NodeSummary, PodSummary, ServiceSummary,
};
use crate::config::QueryConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub total: usize,
    pub ready: usize,
    pub not_ready: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCounts {
    pub total: usize,
    pub running: usize,
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceCounts {
    pub total: usize,
    pub active: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentCounts {
    pub total: usize,
    pub ready: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCounts {
    pub total: usize,
    pub cluster_ip: usize,
    pub node_port: usize,
    pub load_balancer: usize,
    pub external_name: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhealthyPod {
    pub namespace: String,
    pub name: String,
    pub phase: String,
    pub restarts: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub nodes: NodeCounts,
    pub pods: PodCounts,
    pub namespaces: NamespaceCounts,
    pub deployments: DeploymentCounts,
    pub services: ServiceCounts,
    /// Sorted by (namespace, name), at most `unhealthy_limit` entries.
    pub unhealthy_pods: Vec<UnhealthyPod>,
    /// Unhealthy pods before truncation.
    pub unhealthy_total: usize,
}

/// Snapshots gathered for one summary.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeSummary>,
    pub pods: Vec<PodSummary>,
    pub namespaces: Vec<NamespaceSummary>,
    pub deployments: Vec<DeploymentSummary>,
    pub services: Vec<ServiceSummary>,
}

/// Why a pod is unhealthy, or `None` if it is fine.
pub fn unhealthy_reason(
    pod: &PodSummary,
    config: &QueryConfig,
    now: DateTime<Utc>,
) -> Option<String> {
    match pod.phase.as_str() {
        "Failed" => return Some("Failed".to_string()),
        "Pending" => {
            // A creation time in the future has a negative age and is within grace.
            let past_grace = match pod.created {
                Some(created) => now
                    .signed_duration_since(created)
                    .to_std()
                    .map(|age| age > config.pending_grace)
                    .unwrap_or(false),
                None => true,
            };
            if past_grace {
                return Some(format!(
                    "Pending for more than {}s",
                    config.pending_grace.as_secs()
                ));
            }
        }
        _ => {}
    }

    if pod.restarts > config.restart_threshold {
        return Some(format!("Restarted {} times", pod.restarts));
    }

    None
}

pub fn summarize(
    snapshot: &ClusterSnapshot,
    config: &QueryConfig,
    now: DateTime<Utc>,
) -> ClusterSummary {
    let ready_nodes = snapshot.nodes.iter().filter(|n| n.ready).count();
    let nodes = NodeCounts {
        total: snapshot.nodes.len(),
        ready: ready_nodes,
        not_ready: snapshot.nodes.len() - ready_nodes,
    };

    let mut pods = PodCounts {
        total: snapshot.pods.len(),
        ..Default::default()
    };
    for pod in &snapshot.pods {
        match pod.phase.as_str() {
            "Running" => pods.running += 1,
            "Pending" => pods.pending += 1,
            "Succeeded" => pods.succeeded += 1,
            "Failed" => pods.failed += 1,
            _ => pods.unknown += 1,
        }
    }

    let namespaces = NamespaceCounts {
        total: snapshot.namespaces.len(),
        active: snapshot
            .namespaces
            .iter()
            .filter(|ns| ns.phase == "Active")
            .count(),
    };

    let deployments = DeploymentCounts {
        total: snapshot.deployments.len(),
        ready: snapshot.deployments.iter().filter(|d| d.is_ready()).count(),
    };

    let mut services = ServiceCounts {
        total: snapshot.services.len(),
        ..Default::default()
    };
    for service in &snapshot.services {
        match service.service_type.as_str() {
            "ClusterIP" => services.cluster_ip += 1,
            "NodePort" => services.node_port += 1,
            "LoadBalancer" => services.load_balancer += 1,
            "ExternalName" => services.external_name += 1,
            _ => {}
        }
    }

    let mut unhealthy_pods: Vec<UnhealthyPod> = snapshot
        .pods
        .iter()
        .filter_map(|pod| {
            unhealthy_reason(pod, config, now).map(|reason| UnhealthyPod {
                namespace: pod.namespace.clone(),
                name: pod.name.clone(),
                phase: pod.phase.clone(),
                restarts: pod.restarts,
                reason,
            })
        })
        .collect();
    unhealthy_pods.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
    unhealthy_pods.dedup_by(|a, b| a.namespace == b.namespace && a.name == b.name);
    let unhealthy_total = unhealthy_pods.len();
    unhealthy_pods.truncate(config.unhealthy_limit);

    ClusterSummary {
        nodes,
        pods,
        namespaces,
        deployments,
        services,
        unhealthy_pods,
        unhealthy_total,
    }
}
