mod filter;
mod graph;
mod neighbors;
mod parse;
mod prepare;
mod scales;

pub use filter::{Filters, organizations};
pub use graph::{
    BBox, ContributorRecord, Link, LinkEndpoint, Network, Node, NodeData, NodeIndex, NodeKind,
    OriginalLink, OwnerRecord, RepoRecord, Tier,
};
pub use neighbors::{Neighborhood, neighborhood};
pub use parse::{
    RawContributor, RawLink, RawNetwork, RawRepo, load_raw_network, parse_raw_network,
    parse_repo_string,
};
pub use prepare::{PrepareReport, prepare};
pub use scales::{LinearScale, PowScale, Scales, SqrtScale};

#[cfg(test)]
pub(crate) use prepare::fixtures;
