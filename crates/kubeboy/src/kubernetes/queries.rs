use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    client::ClusterApi,
    resources::{
        DeploymentSummary, EventRecord, NamespaceSummary, NodeSummary, PodSummary,
        ServiceSummary,
    },
    summary::{summarize, ClusterSnapshot, ClusterSummary},
};
use crate::{config::QueryConfig, Result};

/// The read-only query functions exposed to the agent.
///
/// Holds the shared cluster handle; cloning is cheap.
#[derive(Clone)]
pub struct ClusterQueries {
    api: Arc<dyn ClusterApi>,
    config: QueryConfig,
}

impl ClusterQueries {
    pub fn new(api: Arc<dyn ClusterApi>, config: QueryConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSummary>> {
        debug!("list_pods namespace={:?}", namespace);
        let pods = self.api.pods(namespace).await?;
        let summaries = pods.iter().map(PodSummary::from).collect();
        Ok(scope_and_sort(summaries, namespace, |p| (&p.namespace, &p.name)))
    }

    pub async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<DeploymentSummary>> {
        debug!("list_deployments namespace={:?}", namespace);
        let deployments = self.api.deployments(namespace).await?;
        let summaries = deployments.iter().map(DeploymentSummary::from).collect();
        Ok(scope_and_sort(summaries, namespace, |d| (&d.namespace, &d.name)))
    }

    pub async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<ServiceSummary>> {
        debug!("list_services namespace={:?}", namespace);
        let services = self.api.services(namespace).await?;
        let summaries = services.iter().map(ServiceSummary::from).collect();
        Ok(scope_and_sort(summaries, namespace, |s| (&s.namespace, &s.name)))
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeSummary>> {
        debug!("list_nodes");
        let mut nodes: Vec<NodeSummary> = self.api.nodes().await?.iter().map(NodeSummary::from).collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes.dedup_by(|a, b| a.name == b.name);
        Ok(nodes)
    }

    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceSummary>> {
        debug!("list_namespaces");
        let mut namespaces: Vec<NamespaceSummary> = self
            .api
            .namespaces()
            .await?
            .iter()
            .map(NamespaceSummary::from)
            .collect();
        namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        namespaces.dedup_by(|a, b| a.name == b.name);
        Ok(namespaces)
    }

    /// Recent events, most recent first.
    ///
    /// `limit` falls back to the configured default.
    pub async fn list_events(
        &self,
        namespace: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<EventRecord>> {
        debug!("list_events namespace={:?} limit={:?}", namespace, limit);
        let events = self.api.events(namespace).await?;
        let records = scope_and_sort(
            events.iter().map(EventRecord::from).collect(),
            namespace,
            |e| (&e.namespace, &e.name),
        );
        Ok(recent_events(
            records,
            limit.unwrap_or(self.config.event_limit),
            &self.config,
            Utc::now(),
        ))
    }

    /// Fresh aggregate of node, pod, namespace, deployment and service state.
    ///
    /// Fails as a whole if any of the underlying reads fails.
    pub async fn cluster_summary(&self) -> Result<ClusterSummary> {
        let (nodes, pods, namespaces, deployments, services) = futures::try_join!(
            self.list_nodes(),
            self.list_pods(None),
            self.list_namespaces(),
            self.list_deployments(None),
            self.list_services(None),
        )?;

        let snapshot = ClusterSnapshot {
            nodes,
            pods,
            namespaces,
            deployments,
            services,
        };
        let summary = summarize(&snapshot, &self.config, Utc::now());
        info!(
            "Cluster summary: {}/{} nodes ready, {} pods, {} unhealthy",
            summary.nodes.ready, summary.nodes.total, summary.pods.total, summary.unhealthy_total
        );
        Ok(summary)
    }
}

/// Keep only items in `namespace` (if given), sort by key and drop duplicates.
fn scope_and_sort<T, F>(mut items: Vec<T>, namespace: Option<&str>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (&String, &String),
{
    if let Some(ns) = namespace {
        items.retain(|item| key(item).0 == ns);
    }
    items.sort_by(|a, b| key(a).cmp(&key(b)));
    items.dedup_by(|a, b| key(&*a) == key(&*b));
    items
}

fn recent_events(
    mut events: Vec<EventRecord>,
    limit: usize,
    config: &QueryConfig,
    now: DateTime<Utc>,
) -> Vec<EventRecord> {
    if let Some(window) = config.event_window {
        events.retain(|e| match e.seen_at() {
            Some(seen) => now
                .signed_duration_since(seen)
                .to_std()
                .map(|age| age <= window)
                .unwrap_or(true),
            None => true,
        });
    }
    // Descending by timestamp; events without one go last. Stable sort keeps
    // the (namespace, name) order among ties.
    events.sort_by(|a, b| b.seen_at().cmp(&a.seen_at()));
    events.truncate(limit);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::fixtures::{event, failed_pod, node, pod, FixtureCluster};
    use crate::Error;

    fn queries(cluster: FixtureCluster) -> ClusterQueries {
        ClusterQueries::new(Arc::new(cluster), QueryConfig::default())
    }

    #[tokio::test]
    async fn test_list_pods_scoped_to_namespace() {
        let cluster = FixtureCluster::default().with_pods(vec![
            pod("default", "web-1"),
            pod("kube-system", "coredns"),
            pod("default", "api-1"),
        ]);
        let pods = queries(cluster).list_pods(Some("default")).await.unwrap();
        assert_eq!(pods.len(), 2);
        assert!(pods.iter().all(|p| p.namespace == "default"));
        assert_eq!(pods[0].name, "api-1");
    }

    #[tokio::test]
    async fn test_list_pods_all_namespaces_without_duplicates() {
        let cluster = FixtureCluster::default().with_pods(vec![
            pod("default", "web-1"),
            pod("default", "web-1"),
            pod("kube-system", "coredns"),
        ]);
        let pods = queries(cluster).list_pods(None).await.unwrap();
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[1].namespace, "kube-system");
    }

    #[tokio::test]
    async fn test_nodes_and_namespaces_sorted_by_name() {
        let cluster = FixtureCluster::default()
            .with_nodes(vec![node("worker-2", true), node("worker-1", false)])
            .with_namespaces(&["kube-system", "default"]);
        let queries = queries(cluster);

        let nodes = queries.list_nodes().await.unwrap();
        assert_eq!(nodes[0].name, "worker-1");
        assert!(!nodes[0].ready);

        let namespaces = queries.list_namespaces().await.unwrap();
        let names: Vec<&str> = namespaces.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["default", "kube-system"]);
        assert_eq!(namespaces[0].phase, "Active");
    }

    #[tokio::test]
    async fn test_events_most_recent_first_and_limited() {
        let now = Utc::now();
        let cluster = FixtureCluster::default().with_events(vec![
            event("default", "old", now - chrono::Duration::minutes(30)),
            event("default", "newest", now - chrono::Duration::minutes(1)),
            event("default", "middle", now - chrono::Duration::minutes(10)),
            event("default", "stale", now - chrono::Duration::hours(5)),
        ]);
        let events = queries(cluster).list_events(None, Some(2)).await.unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["newest", "middle"]);
    }

    #[tokio::test]
    async fn test_events_window_drops_stale() {
        let now = Utc::now();
        let cluster = FixtureCluster::default().with_events(vec![
            event("default", "fresh", now - chrono::Duration::minutes(5)),
            event("default", "stale", now - chrono::Duration::hours(5)),
        ]);
        let events = queries(cluster).list_events(Some("default"), None).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "fresh");
    }

    #[tokio::test]
    async fn test_cluster_summary_end_to_end() {
        let cluster = FixtureCluster::default()
            .with_nodes(vec![node("n1", true), node("n2", true), node("n3", false)])
            .with_pods(vec![
                pod("default", "a"),
                pod("default", "b"),
                pod("default", "c"),
                failed_pod("default", "broken"),
            ]);
        let summary = queries(cluster).cluster_summary().await.unwrap();
        assert_eq!(summary.nodes.ready, 2);
        assert_eq!(summary.nodes.not_ready, 1);
        assert_eq!(summary.pods.running, 3);
        assert_eq!(summary.unhealthy_pods.len(), 1);
        assert_eq!(summary.unhealthy_pods[0].namespace, "default");
        assert_eq!(summary.unhealthy_pods[0].name, "broken");
    }

    #[tokio::test]
    async fn test_cluster_summary_fails_when_nodes_unreachable() {
        let cluster = FixtureCluster::default()
            .with_pods(vec![pod("default", "a")])
            .failing_nodes();
        let err = queries(cluster).cluster_summary().await.unwrap_err();
        assert!(matches!(err, Error::ClusterUnreachable(_)));
    }
}
