//! Per-node CPU and memory request accounting for Kubernetes clusters.

pub mod aggregate;
pub mod cli;
pub mod cluster;
pub mod error;
pub mod model;
pub mod quantity;
pub mod render;
pub mod resources;

pub use aggregate::{aggregate, ClusterTotals, NodeUtilization, PodRequests, Report};
pub use cluster::{collect_report, ClusterSource, KubeCluster};
pub use error::{Diagnostic, QuantityError, Resource};
pub use model::{ContainerSnapshot, NodeSnapshot, PodRef, PodSnapshot};
pub use quantity::{parse_cpu, parse_memory, Mebibytes, Millicores};
pub use resources::Resources;
