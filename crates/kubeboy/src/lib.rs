pub mod agent;
pub mod cli;
pub mod config;
pub mod kubernetes;

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cluster unreachable: {0}")]
    ClusterUnreachable(String),
    #[error("Not found: {0}")]
    ResourceNotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Timed out after {}s: {operation}", .after.as_secs())]
    Timeout { operation: String, after: Duration },
    #[error("Language model error: {0}")]
    UpstreamModel(String),
    #[error("Kubernetes error: {0}")]
    Kubernetes(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    /// Stable identifier handed to the agent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ClusterUnreachable(_) => "cluster_unreachable",
            Error::ResourceNotFound(_) => "resource_not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Timeout { .. } => "timeout",
            Error::UpstreamModel(_) => "upstream_model_error",
            Error::Kubernetes(_) => "kubernetes_error",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
            Error::SerdeJson(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_operation_and_seconds() {
        let err = Error::Timeout {
            operation: "list nodes".to_string(),
            after: Duration::from_secs(15),
        };
        assert_eq!(err.to_string(), "Timed out after 15s: list nodes");
        assert_eq!(err.kind(), "timeout");
    }
}
