use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use super::scales::Scales;

pub type NodeIndex = usize;

/// Node kinds, ordered the way nodes are sorted for drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Contributor,
    Owner,
    Repo,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Owner => "owner",
            Self::Repo => "repo",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Core,
    Community,
}

/// A contributor→repo link as it was before owner grouping rewrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalLink {
    pub contributor: String,
    pub repo: String,
    pub owner: String,
}

#[derive(Clone, Debug)]
pub struct ContributorRecord {
    pub name: String,
    pub tier: Tier,
    pub total_commits: u64,
    pub links_original: Vec<OriginalLink>,
}

#[derive(Clone, Debug)]
pub struct RepoRecord {
    pub full_name: String,
    pub owner: String,
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub languages: Vec<String>,
    pub multi_repo_owner: bool,
    pub links_original: Vec<OriginalLink>,
}

#[derive(Clone, Debug)]
pub struct OwnerRecord {
    pub name: String,
    pub repos: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub single_contributor: bool,
}

#[derive(Clone, Debug)]
pub enum NodeData {
    Contributor(ContributorRecord),
    Repo(RepoRecord),
    Owner(OwnerRecord),
}

/// Axis-aligned box relative to a node position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BBox {
    pub fn square(half: f32) -> Self {
        Self {
            min: vec2(-half, -half),
            max: vec2(half, half),
        }
    }

    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub data: NodeData,
    pub pos: Vec2,
    pub pin: Option<Vec2>,
    pub r: f32,
    /// Radius of the node together with its cloud.
    pub max_radius: f32,
    pub degree: usize,
    pub bbox: Option<BBox>,
    /// Satellite nodes clustered around this owner or contributor. Their
    /// positions are relative to this node until a later phase translates them.
    pub cloud: Vec<NodeIndex>,
    pub node_central: bool,
    pub contributor_angle: Option<f32>,
}

impl Node {
    pub fn new(id: String, label: String, data: NodeData) -> Self {
        Self {
            id,
            label,
            data,
            pos: Vec2::ZERO,
            pin: None,
            r: 0.0,
            max_radius: 0.0,
            degree: 0,
            bbox: None,
            cloud: Vec::new(),
            node_central: false,
            contributor_angle: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Contributor(_) => NodeKind::Contributor,
            NodeData::Repo(_) => NodeKind::Repo,
            NodeData::Owner(_) => NodeKind::Owner,
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match &self.data {
            NodeData::Contributor(record) => Some(record.tier),
            NodeData::Repo(_) | NodeData::Owner(_) => None,
        }
    }

    pub fn is_community(&self) -> bool {
        self.tier() == Some(Tier::Community)
    }

    pub fn is_single_contributor_owner(&self) -> bool {
        matches!(&self.data, NodeData::Owner(owner) if owner.single_contributor)
    }

    pub fn has_multi_repo_owner(&self) -> bool {
        matches!(&self.data, NodeData::Repo(repo) if repo.multi_repo_owner)
    }

    pub fn links_original(&self) -> &[OriginalLink] {
        match &self.data {
            NodeData::Contributor(record) => &record.links_original,
            NodeData::Repo(record) => &record.links_original,
            NodeData::Owner(_) => &[],
        }
    }

    pub fn pin_at(&mut self, position: Vec2) {
        self.pos = position;
        self.pin = Some(position);
    }

    pub fn pin_in_place(&mut self) {
        self.pin = Some(self.pos);
    }

    pub fn unpin(&mut self) {
        self.pin = None;
    }
}

/// A link endpoint: an id as loaded, or a node reference once resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEndpoint {
    Id(String),
    Ref(NodeIndex),
}

impl LinkEndpoint {
    /// The id this endpoint names, whichever form it is in.
    pub fn node_id<'a>(&'a self, nodes: &'a [Node]) -> Option<&'a str> {
        match self {
            Self::Id(id) => Some(id.as_str()),
            Self::Ref(index) => nodes.get(*index).map(|node| node.id.as_str()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
    pub commit_count: u64,
    pub commit_sec_min: i64,
    pub commit_sec_max: i64,
    pub owner: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub central: NodeIndex,
    pub scales: Scales,
    index_by_id: HashMap<String, NodeIndex>,
}

impl Network {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>, central: NodeIndex, scales: Scales) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        Self {
            nodes,
            links,
            central,
            scales,
            index_by_id,
        }
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index_by_id.get(id).copied()
    }

    /// Normalizes an endpoint to a node index. Every endpoint comparison in
    /// the crate goes through here.
    pub fn endpoint(&self, endpoint: &LinkEndpoint) -> Option<NodeIndex> {
        match endpoint {
            LinkEndpoint::Id(id) => self.index_of(id),
            LinkEndpoint::Ref(index) => (*index < self.nodes.len()).then_some(*index),
        }
    }

    pub fn link_ends(&self, link: &Link) -> Option<(NodeIndex, NodeIndex)> {
        Some((self.endpoint(&link.source)?, self.endpoint(&link.target)?))
    }

    /// Resolved `(source, target)` pairs for every link that resolves.
    pub fn resolved_links(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.links
            .iter()
            .filter_map(|link| self.link_ends(link))
            .collect()
    }

    pub fn central_node(&self) -> &Node {
        &self.nodes[self.central]
    }

    pub fn indices_of_kind(&self, kind: NodeKind) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind() == kind)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn count_of_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind() == kind).count()
    }
}
