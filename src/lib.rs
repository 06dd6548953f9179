//! Radial layout engine for contributor networks.
//!
//! A network of contributors, repositories and owners is laid out around a
//! single central repository in strictly ordered phases (owner clouds,
//! contributor clouds, ring placement, collaboration, community band), and an
//! interaction layer answers nearest-node queries over the result.

pub mod error;
pub mod interaction;
pub mod layout;
pub mod network;
pub mod util;

pub use error::{InteractionError, LayoutError, NetworkError};
pub use interaction::{Interaction, InteractionState, Viewport};
pub use layout::{Layout, LayoutConfig, RingGeometry};
pub use network::{Link, LinkEndpoint, Network, Node, NodeIndex, NodeKind, Tier};
