use crate::types::{Edge, VInt};

/// Precondition failures of the graph store and the analyses built on it.
///
/// None of these are retried internally; the offending call is aborted and
/// the graph is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// An operation referenced a vertex that was never added.
    #[error("unknown vertex: {0}")]
    UnknownVertex(VInt),

    /// A vertex id was inserted twice.
    #[error("duplicate vertex: {0}")]
    DuplicateVertex(VInt),

    /// Removal of an edge that is not currently stored.
    #[error("invalid edge removal: {0} is not in the graph")]
    InvalidEdgeRemoval(Edge),

    /// A cancellation checkpoint observed a tripped token.
    #[error("computation cancelled")]
    Cancelled,
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
