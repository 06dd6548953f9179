use std::collections::BTreeSet;

use super::graph::{Network, NodeData, NodeIndex, NodeKind};

/// Nodes and link indices highlighted around a focused node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    pub nodes: Vec<NodeIndex>,
    pub links: Vec<usize>,
}

/// Linked nodes of `focus`, skipping the central node and its links. A
/// neighboring owner is looked through: contributors also reach the repos
/// they committed to under it, repos reach the contributors that committed.
pub fn neighborhood(network: &Network, focus: NodeIndex) -> Neighborhood {
    let central = network.central;
    let mut nodes = BTreeSet::new();
    let mut links = BTreeSet::new();

    for (link_index, link) in network.links.iter().enumerate() {
        let Some((source, target)) = network.link_ends(link) else {
            continue;
        };
        if source == central || target == central {
            continue;
        }
        if source == focus {
            nodes.insert(target);
            links.insert(link_index);
        } else if target == focus {
            nodes.insert(source);
            links.insert(link_index);
        }
    }

    let Some(focus_node) = network.nodes.get(focus) else {
        return Neighborhood::default();
    };
    let expands = match focus_node.kind() {
        NodeKind::Contributor => true,
        NodeKind::Repo => focus != central,
        NodeKind::Owner => false,
    };

    if expands {
        let owners = nodes
            .iter()
            .copied()
            .filter(|&index| matches!(network.nodes[index].data, NodeData::Owner(_)))
            .collect::<Vec<_>>();

        for owner in owners {
            let owner_id = network.nodes[owner].id.as_str();
            for original in focus_node.links_original() {
                if original.owner != owner_id {
                    continue;
                }
                let (other_id, link_from, link_to) = match focus_node.kind() {
                    NodeKind::Contributor => (original.repo.as_str(), owner_id, original.repo.as_str()),
                    _ => (
                        original.contributor.as_str(),
                        original.contributor.as_str(),
                        owner_id,
                    ),
                };
                let Some(other) = network.index_of(other_id) else {
                    continue;
                };
                nodes.insert(other);

                let connecting = network.links.iter().position(|link| {
                    network.link_ends(link).is_some_and(|(source, target)| {
                        network.nodes[source].id == link_from && network.nodes[target].id == link_to
                    })
                });
                if let Some(link_index) = connecting {
                    links.insert(link_index);
                }
            }
        }
    }

    nodes.remove(&central);
    nodes.remove(&focus);

    // No ring through the central node and its own owner.
    let central_node = network.central_node();
    if let NodeData::Repo(repo) = &central_node.data {
        links.retain(|&link_index| {
            network
                .link_ends(&network.links[link_index])
                .is_none_or(|(source, target)| {
                    !(target == central && network.nodes[source].id == repo.owner)
                })
        });
    }

    Neighborhood {
        nodes: nodes.into_iter().collect(),
        links: links.into_iter().collect(),
    }
}
