//! Read-only snapshots of the cluster objects the aggregation consumes.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::{Container, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use serde::Serialize;

/// Resource name (`"cpu"`, `"memory"`, ...) to raw quantity string.
pub type ResourceList = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub name: String,
    pub allocatable: ResourceList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSnapshot {
    pub name: String,
    pub requests: ResourceList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    /// `None` or empty while the pod is unscheduled.
    pub node_name: Option<String>,
    pub containers: Vec<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl PodSnapshot {
    pub fn pod_ref(&self) -> PodRef {
        PodRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// The node this pod is bound to, treating an empty name as unscheduled.
    pub fn assigned_node(&self) -> Option<&str> {
        self.node_name.as_deref().filter(|name| !name.is_empty())
    }
}

fn resource_list(quantities: Option<&BTreeMap<String, Quantity>>) -> ResourceList {
    quantities
        .map(|list| list.iter().map(|(k, q)| (k.clone(), q.0.clone())).collect())
        .unwrap_or_default()
}

impl NodeSnapshot {
    /// Returns `None` for nodes the API returned without a name.
    pub fn from_node(node: &Node) -> Option<NodeSnapshot> {
        let name = node.metadata.name.clone()?;
        let allocatable = resource_list(node.status.as_ref().and_then(|s| s.allocatable.as_ref()));

        Some(NodeSnapshot { name, allocatable })
    }
}

impl From<&Container> for ContainerSnapshot {
    fn from(container: &Container) -> Self {
        ContainerSnapshot {
            name: container.name.clone(),
            requests: resource_list(
                container
                    .resources
                    .as_ref()
                    .and_then(|r| r.requests.as_ref()),
            ),
        }
    }
}

impl From<&Pod> for PodSnapshot {
    fn from(pod: &Pod) -> Self {
        let spec = pod.spec.as_ref();

        PodSnapshot {
            name: pod.name_any(),
            namespace: pod.namespace().unwrap_or_default(),
            node_name: spec.and_then(|s| s.node_name.clone()),
            containers: spec
                .map(|s| s.containers.iter().map(ContainerSnapshot::from).collect())
                .unwrap_or_default(),
        }
    }
}
