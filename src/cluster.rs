//! Access to the node and pod lists a report is computed from.

use std::future::Future;

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::{api::Api, Client};
use tracing::{info, warn};

use crate::aggregate::{aggregate, Report};
use crate::model::{NodeSnapshot, PodSnapshot};

/// Something that can list the nodes and pods of one cluster.
pub trait ClusterSource {
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<NodeSnapshot>>> + Send;
    fn list_pods(&self) -> impl Future<Output = Result<Vec<PodSnapshot>>> + Send;
}

/// Fetches both lists concurrently and aggregates them.
pub async fn collect_report<S: ClusterSource>(source: &S) -> Result<Report> {
    let (nodes, pods) = tokio::try_join!(source.list_nodes(), source.list_pods())?;
    info!(nodes = nodes.len(), pods = pods.len(), "fetched cluster state");

    Ok(aggregate(&nodes, &pods))
}

/// [`ClusterSource`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        KubeCluster { client }
    }
}

impl ClusterSource for KubeCluster {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes
            .list(&Default::default())
            .await
            .context("listing nodes")?;

        Ok(node_list
            .items
            .iter()
            .filter_map(|node| {
                let snapshot = NodeSnapshot::from_node(node);
                if snapshot.is_none() {
                    warn!("skipping node without a name");
                }
                snapshot
            })
            .collect())
    }

    async fn list_pods(&self) -> Result<Vec<PodSnapshot>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let pod_list = pods
            .list(&Default::default())
            .await
            .context("listing pods")?;

        Ok(pod_list.items.iter().map(PodSnapshot::from).collect())
    }
}
