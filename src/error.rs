use thiserror::Error;

use crate::network::NodeIndex;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid repo string {0:?}: expected \"owner/name\"")]
    InvalidRepoName(String),
    #[error("central node {0:?} is not part of the network")]
    MissingCentralNode(String),
    #[error("network is empty after filtering")]
    EmptyNetwork,
    #[error("invalid network JSON")]
    Json(#[from] serde_json::Error),
    #[error("failed to read network data")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LayoutError {
    /// Ring positioning needs the central node pinned first.
    #[error("central node must be pinned before ring positioning (fx={fx}, fy={fy})")]
    CentralNotPinned { fx: f32, fy: f32 },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("node index {0} does not resolve to a node")]
    StaleNode(NodeIndex),
}
