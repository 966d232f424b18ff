//! [`KubeGateway`] — the Kubernetes-backed [`ClusterGateway`].

use std::path::Path;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service as KubeService;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use thiserror::Error;
use tracing::debug;

use swap_core::{LabelSelector, ReplicaGroup, Scale, Service};
use swapgrid_gateway::{ClusterGateway, Deletion, GatewayError, GatewayResult, ResourceKind};

use crate::convert::{
    deployment_from_replica_group, kube_scale, kube_service, map_kube_error,
    replica_group_from_deployment, scale_from_kube, service_from_kube,
};

/// Failure to build a client from local configuration.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] KubeconfigError),

    #[error("failed to infer cluster configuration: {0}")]
    Infer(#[from] InferConfigError),

    #[error("failed to create client: {0}")]
    Client(#[from] kube::Error),
}

/// Deployments and Services in a single namespace.
#[derive(Clone)]
pub struct KubeGateway {
    namespace: String,
    deployments: Api<Deployment>,
    services: Api<KubeService>,
}

impl KubeGateway {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            deployments: Api::namespaced(client.clone(), namespace),
            services: Api::namespaced(client, namespace),
        }
    }

    /// Build a client from `kubeconfig`, or from the usual inference chain
    /// (`$KUBECONFIG`, `~/.kube/config`, in-cluster) when no path is given.
    pub async fn connect(kubeconfig: Option<&Path>, namespace: &str) -> Result<Self, ConnectError> {
        let config = match kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), "loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            None => Config::infer().await?,
        };
        let client = Client::try_from(config)?;
        Ok(Self::new(client, namespace))
    }
}

/// Foreground propagation keeps the Deployment visible until its
/// ReplicaSets and pods are gone, so an absence poll covers them too.
fn delete_params() -> DeleteParams {
    DeleteParams::foreground()
}

impl ClusterGateway for KubeGateway {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_service(&self, name: &str) -> GatewayResult<Service> {
        self.services
            .get(name)
            .await
            .map(|s| service_from_kube(&s))
            .map_err(|e| map_kube_error(e, ResourceKind::Service, name))
    }

    async fn update_service(&self, service: &Service) -> GatewayResult<Service> {
        let body = kube_service(service);
        self.services
            .replace(&service.name, &PostParams::default(), &body)
            .await
            .map(|s| service_from_kube(&s))
            .map_err(|e| map_kube_error(e, ResourceKind::Service, &service.name))
    }

    async fn list_replica_groups(&self, selector: &LabelSelector) -> GatewayResult<Vec<ReplicaGroup>> {
        let encoded = selector.encode();
        let list = self
            .deployments
            .list(&ListParams::default().labels(&encoded))
            .await
            .map_err(|e| map_kube_error(e, ResourceKind::ReplicaGroup, &encoded))?;
        Ok(list.items.iter().map(replica_group_from_deployment).collect())
    }

    async fn get_replica_group(&self, name: &str) -> GatewayResult<ReplicaGroup> {
        self.deployments
            .get(name)
            .await
            .map(|d| replica_group_from_deployment(&d))
            .map_err(|e| map_kube_error(e, ResourceKind::ReplicaGroup, name))
    }

    async fn create_replica_group(&self, group: &ReplicaGroup) -> GatewayResult<ReplicaGroup> {
        let body = deployment_from_replica_group(group);
        self.deployments
            .create(&PostParams::default(), &body)
            .await
            .map(|d| replica_group_from_deployment(&d))
            .map_err(|e| map_kube_error(e, ResourceKind::ReplicaGroup, &group.name))
    }

    async fn delete_replica_group(&self, name: &str) -> GatewayResult<Deletion> {
        match self.deployments.delete(name, &delete_params()).await {
            Ok(_) => Ok(Deletion::Deleted),
            Err(e) => match map_kube_error(e, ResourceKind::ReplicaGroup, name) {
                GatewayError::NotFound { .. } => Ok(Deletion::Absent),
                other => Err(other),
            },
        }
    }

    async fn get_scale(&self, name: &str) -> GatewayResult<Scale> {
        self.deployments
            .get_scale(name)
            .await
            .map(|s| scale_from_kube(name, &s))
            .map_err(|e| map_kube_error(e, ResourceKind::ReplicaGroup, name))
    }

    async fn update_scale(&self, name: &str, scale: &Scale) -> GatewayResult<Scale> {
        let body = serde_json::to_vec(&kube_scale(&self.namespace, scale))
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        self.deployments
            .replace_scale(name, &PostParams::default(), body)
            .await
            .map(|s| scale_from_kube(name, &s))
            .map_err(|e| map_kube_error(e, ResourceKind::ReplicaGroup, name))
    }
}
