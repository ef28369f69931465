//! Read-only access to the Kubernetes API.

pub mod client;
pub mod queries;
pub mod resources;
pub mod summary;

#[cfg(test)]
pub(crate) mod fixtures;

pub use client::{ClusterApi, KubeCluster};
pub use queries::ClusterQueries;
pub use resources::{
    DeploymentSummary, EventRecord, NamespaceSummary, NodeSummary, PodSummary, ServiceSummary,
};
pub use summary::{ClusterSummary, UnhealthyPod};
