use serde::Serialize;

use crate::model::PodRef;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuantityError {
    #[error("invalid quantity: {0:?}")]
    InvalidQuantity(String),
    #[error("unsupported unit in quantity: {0:?}")]
    UnsupportedUnit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Cpu,
    Memory,
}

impl Resource {
    pub const fn key(self) -> &'static str {
        match self {
            Resource::Cpu => "cpu",
            Resource::Memory => "memory",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Something the aggregation skipped or could not parse. None of these stop a report.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    #[error("node {node} is listed more than once, keeping the first entry")]
    DuplicateNode { node: String },
    #[error("pod {pod} is not scheduled on any node")]
    UnscheduledPod { pod: PodRef },
    #[error("pod {pod} references unknown node {node:?}")]
    UnknownNodeReference { pod: PodRef, node: String },
    #[error("node {node}: allocatable {resource}: {error}")]
    InvalidAllocatable {
        node: String,
        resource: Resource,
        error: QuantityError,
    },
    #[error("pod {pod}, container {container}: {resource} request: {error}")]
    InvalidRequest {
        pod: PodRef,
        container: String,
        resource: Resource,
        error: QuantityError,
    },
    #[error("{scope}: total {resource} exceeds the representable range, capped")]
    TotalOverflow { scope: String, resource: Resource },
}
