use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod, Service};
use kube::{
    api::{Api, ListParams},
    config::KubeConfigOptions,
    Client,
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::{config::KubeConfig, Error, Result};

/// Read-only view of the cluster.
///
/// Every method maps to a single `list` call. `namespace: None` means
/// cluster scope.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>>;
    async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>>;
    async fn services(&self, namespace: Option<&str>) -> Result<Vec<Service>>;
    async fn events(&self, namespace: Option<&str>) -> Result<Vec<Event>>;
    async fn nodes(&self) -> Result<Vec<Node>>;
    async fn namespaces(&self) -> Result<Vec<Namespace>>;
}

/// `ClusterApi` backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    timeout: Duration,
}

impl KubeCluster {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Connect using the ambient kubeconfig (or in-cluster service account).
    pub async fn connect(config: &KubeConfig) -> Result<Self> {
        let client = match &config.context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..Default::default()
                };
                let kube_config = kube::Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| Error::Config(format!("failed to load kubeconfig context '{}': {}", context, e)))?;
                Client::try_from(kube_config)
                    .map_err(|e| Error::Config(format!("failed to build Kubernetes client: {}", e)))?
            }
            None => Client::try_default()
                .await
                .map_err(|e| Error::Config(format!("failed to infer Kubernetes config: {}", e)))?,
        };

        Ok(Self::new(client, config.request_timeout))
    }

    fn api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    async fn list<K>(&self, api: Api<K>, what: &str) -> Result<Vec<K>>
    where
        K: Clone + DeserializeOwned + Debug,
    {
        debug!("Listing {}", what);
        let list = with_timeout(self.timeout, what, api.list(&ListParams::default()))
            .await?
            .map_err(|e| map_kube_error(e, what))?;
        Ok(list.items)
    }
}

/// Bound `fut` by `after`, reporting expiry as `Error::Timeout`.
pub(crate) async fn with_timeout<F, T>(after: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| Error::Timeout {
            operation: operation.to_string(),
            after,
        })
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        self.list(self.api::<Pod>(namespace), &scoped("pods", namespace)).await
    }

    async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>> {
        self.list(self.api::<Deployment>(namespace), &scoped("deployments", namespace))
            .await
    }

    async fn services(&self, namespace: Option<&str>) -> Result<Vec<Service>> {
        self.list(self.api::<Service>(namespace), &scoped("services", namespace))
            .await
    }

    async fn events(&self, namespace: Option<&str>) -> Result<Vec<Event>> {
        self.list(self.api::<Event>(namespace), &scoped("events", namespace))
            .await
    }

    async fn nodes(&self) -> Result<Vec<Node>> {
        self.list(Api::<Node>::all(self.client.clone()), "nodes").await
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>> {
        self.list(Api::<Namespace>::all(self.client.clone()), "namespaces")
            .await
    }
}

fn scoped(resource: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{} in namespace {}", resource, ns),
        None => format!("{} in all namespaces", resource),
    }
}

/// Sort a kube client failure into the crate's error taxonomy.
pub(crate) fn map_kube_error(err: kube::Error, what: &str) -> Error {
    match err {
        kube::Error::Api(resp) => match resp.code {
            404 => Error::ResourceNotFound(format!("{}: {}", what, resp.message)),
            401 | 403 => Error::ClusterUnreachable(format!(
                "access denied listing {}: {}",
                what, resp.message
            )),
            code => Error::Kubernetes(format!("listing {} failed ({}): {}", what, code, resp.message)),
        },
        kube::Error::SerdeError(e) => {
            Error::Kubernetes(format!("could not decode {}: {}", what, e))
        }
        other => Error::ClusterUnreachable(format!("listing {}: {}", what, other)),
    }
}
