use crate::model::{NodeId, NodeStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: NodeStatus, to: NodeStatus },
}

pub type Result<T> = std::result::Result<T, GraphError>;
