//! Groups pods by node and rolls their requests up against node allocatable.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{Diagnostic, QuantityError, Resource};
use crate::model::{NodeSnapshot, PodSnapshot};
use crate::quantity::{parse_cpu, parse_memory, Mebibytes, Millicores};
use crate::resources::Resources;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodRequests {
    pub name: String,
    pub namespace: String,
    pub requested: Resources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeUtilization {
    pub name: String,
    /// `None` when the node's allocatable value could not be parsed.
    pub allocatable_cpu: Option<Millicores>,
    pub allocatable_memory: Option<Mebibytes>,
    pub requested: Resources,
    /// Percentage, undefined when allocatable is unknown or zero.
    pub cpu_utilization: Option<f64>,
    pub memory_utilization: Option<f64>,
    pub pods: Vec<PodRequests>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTotals {
    pub allocatable: Resources,
    pub requested: Resources,
    pub cpu_utilization: Option<f64>,
    pub memory_utilization: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub nodes: Vec<NodeUtilization>,
    pub cluster: ClusterTotals,
    pub diagnostics: Vec<Diagnostic>,
}

/// `requested / allocatable` as a percentage.
pub fn utilization(requested: u64, allocatable: u64) -> Option<f64> {
    if allocatable == 0 {
        return None;
    }
    Some(requested as f64 / allocatable as f64 * 100.0)
}

/// Builds one utilization record per node, in input order.
///
/// Pods that are unscheduled or bound to a node missing from `nodes` are left
/// out of every total and reported in the diagnostics instead. When a node
/// name appears more than once only the first entry is reported.
#[instrument(skip_all, fields(nodes = nodes.len(), pods = pods.len()))]
pub fn aggregate(nodes: &[NodeSnapshot], pods: &[PodSnapshot]) -> Report {
    let mut diagnostics = Vec::new();

    let mut pods_by_node: HashMap<&str, Vec<&PodSnapshot>> = HashMap::with_capacity(nodes.len());
    let mut unique_nodes = Vec::with_capacity(nodes.len());
    for node in nodes {
        if pods_by_node.contains_key(node.name.as_str()) {
            diagnostics.push(Diagnostic::DuplicateNode {
                node: node.name.clone(),
            });
            continue;
        }
        pods_by_node.insert(node.name.as_str(), Vec::new());
        unique_nodes.push(node);
    }

    for pod in pods {
        let Some(node_name) = pod.assigned_node() else {
            diagnostics.push(Diagnostic::UnscheduledPod { pod: pod.pod_ref() });
            continue;
        };
        match pods_by_node.get_mut(node_name) {
            Some(bound) => bound.push(pod),
            None => diagnostics.push(Diagnostic::UnknownNodeReference {
                pod: pod.pod_ref(),
                node: node_name.to_string(),
            }),
        }
    }

    let nodes: Vec<NodeUtilization> = unique_nodes
        .into_iter()
        .map(|node| {
            let bound = pods_by_node
                .get(node.name.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            node_utilization(node, bound, &mut diagnostics)
        })
        .collect();

    let cluster = cluster_totals(&nodes, &mut diagnostics);
    debug!(diagnostics = diagnostics.len(), "aggregation finished");

    Report {
        nodes,
        cluster,
        diagnostics,
    }
}

/// Sums `items` and records a diagnostic for every dimension that had to be capped.
fn checked_total<I>(
    scope: impl Fn() -> String,
    items: I,
    diagnostics: &mut Vec<Diagnostic>,
) -> Resources
where
    I: IntoIterator<Item = Resources>,
{
    let (total, overflowed) = Resources::accumulate(items);
    diagnostics.extend(
        overflowed
            .into_iter()
            .map(|resource| Diagnostic::TotalOverflow {
                scope: scope(),
                resource,
            }),
    );
    total
}

fn node_utilization(
    node: &NodeSnapshot,
    pods: &[&PodSnapshot],
    diagnostics: &mut Vec<Diagnostic>,
) -> NodeUtilization {
    let mut allocatable_error = |resource: Resource, error: QuantityError| {
        diagnostics.push(Diagnostic::InvalidAllocatable {
            node: node.name.clone(),
            resource,
            error,
        })
    };

    let allocatable_cpu = match node.allocatable.get(Resource::Cpu.key()) {
        None => Some(Millicores::default()),
        Some(raw) => parse_cpu(raw)
            .map_err(|e| allocatable_error(Resource::Cpu, e))
            .ok(),
    };
    let allocatable_memory = match node.allocatable.get(Resource::Memory.key()) {
        None => Some(Mebibytes::default()),
        Some(raw) => parse_memory(raw)
            .map_err(|e| allocatable_error(Resource::Memory, e))
            .ok(),
    };

    let pods: Vec<PodRequests> = pods
        .iter()
        .map(|pod| pod_requests(pod, diagnostics))
        .collect();
    let requested = checked_total(
        || format!("node {}", node.name),
        pods.iter().map(|pod| pod.requested),
        diagnostics,
    );

    NodeUtilization {
        name: node.name.clone(),
        allocatable_cpu,
        allocatable_memory,
        requested,
        cpu_utilization: allocatable_cpu.and_then(|a| utilization(requested.cpu.0, a.0)),
        memory_utilization: allocatable_memory.and_then(|a| utilization(requested.memory.0, a.0)),
        pods,
    }
}

fn pod_requests(pod: &PodSnapshot, diagnostics: &mut Vec<Diagnostic>) -> PodRequests {
    let mut containers = Vec::with_capacity(pod.containers.len());
    for container in &pod.containers {
        let (requests, errors) = Resources::from_requests(&container.requests);
        diagnostics.extend(errors.into_iter().map(|(resource, error)| {
            Diagnostic::InvalidRequest {
                pod: pod.pod_ref(),
                container: container.name.clone(),
                resource,
                error,
            }
        }));
        containers.push(requests);
    }

    PodRequests {
        name: pod.name.clone(),
        namespace: pod.namespace.clone(),
        requested: checked_total(|| format!("pod {}", pod.pod_ref()), containers, diagnostics),
    }
}

fn cluster_totals(nodes: &[NodeUtilization], diagnostics: &mut Vec<Diagnostic>) -> ClusterTotals {
    let requested = checked_total(
        || "cluster requests".to_string(),
        nodes.iter().map(|node| node.requested),
        diagnostics,
    );
    let allocatable = checked_total(
        || "cluster allocatable".to_string(),
        nodes.iter().map(|node| Resources {
            cpu: node.allocatable_cpu.unwrap_or_default(),
            memory: node.allocatable_memory.unwrap_or_default(),
        }),
        diagnostics,
    );

    ClusterTotals {
        allocatable,
        requested,
        cpu_utilization: utilization(requested.cpu.0, allocatable.cpu.0),
        memory_utilization: utilization(requested.memory.0, allocatable.memory.0),
    }
}
