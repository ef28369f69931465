//! In-memory `ClusterApi` for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Event, Namespace, NamespaceStatus, Node, NodeCondition, NodeStatus, ObjectReference, Pod,
    PodStatus, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::ClusterApi;
use crate::{Error, Result};

#[derive(Default)]
pub struct FixtureCluster {
    pods: Vec<Pod>,
    nodes: Vec<Node>,
    namespaces: Vec<Namespace>,
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    events: Vec<Event>,
    nodes_unreachable: bool,
    calls: AtomicUsize,
}

impl FixtureCluster {
    pub fn with_pods(mut self, pods: Vec<Pod>) -> Self {
        self.pods = pods;
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_namespaces(mut self, names: &[&str]) -> Self {
        self.namespaces = names
            .iter()
            .map(|name| Namespace {
                metadata: meta(None, name),
                status: Some(NamespaceStatus {
                    phase: Some("Active".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn failing_nodes(mut self) -> Self {
        self.nodes_unreachable = true;
        self
    }

    /// Number of API calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn in_namespace<T: kube::Resource>(items: &[T], namespace: Option<&str>) -> Vec<T>
where
    T: Clone,
{
    items
        .iter()
        .filter(|item| namespace.is_none() || item.meta().namespace.as_deref() == namespace)
        .cloned()
        .collect()
}

#[async_trait]
impl ClusterApi for FixtureCluster {
    async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        self.record();
        Ok(in_namespace(&self.pods, namespace))
    }

    async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>> {
        self.record();
        Ok(in_namespace(&self.deployments, namespace))
    }

    async fn services(&self, namespace: Option<&str>) -> Result<Vec<Service>> {
        self.record();
        Ok(in_namespace(&self.services, namespace))
    }

    async fn events(&self, namespace: Option<&str>) -> Result<Vec<Event>> {
        self.record();
        Ok(in_namespace(&self.events, namespace))
    }

    async fn nodes(&self) -> Result<Vec<Node>> {
        self.record();
        if self.nodes_unreachable {
            return Err(Error::ClusterUnreachable("connection refused".to_string()));
        }
        Ok(self.nodes.clone())
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>> {
        self.record();
        Ok(self.namespaces.clone())
    }
}

fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        creation_timestamp: Some(Time(Utc::now() - chrono::Duration::hours(1))),
        ..Default::default()
    }
}

fn pod_in_phase(namespace: &str, name: &str, phase: &str) -> Pod {
    Pod {
        metadata: meta(Some(namespace), name),
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn pod(namespace: &str, name: &str) -> Pod {
    pod_in_phase(namespace, name, "Running")
}

pub fn failed_pod(namespace: &str, name: &str) -> Pod {
    pod_in_phase(namespace, name, "Failed")
}

pub fn node(name: &str, ready: bool) -> Node {
    Node {
        metadata: meta(None, name),
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: if ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn event(namespace: &str, name: &str, last_seen: DateTime<Utc>) -> Event {
    Event {
        metadata: meta(Some(namespace), name),
        involved_object: ObjectReference {
            kind: Some("Pod".to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        reason: Some("BackOff".to_string()),
        last_timestamp: Some(Time(last_seen)),
        count: Some(1),
        ..Default::default()
    }
}
