use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::graph::{
    ContributorRecord, Link, LinkEndpoint, Network, Node, NodeData, NodeKind, OriginalLink,
    OwnerRecord, RepoRecord,
};
use super::parse::{RawNetwork, parse_repo_string, split_languages};
use super::scales::{PowScale, Scales, SqrtScale, extent};
use crate::error::NetworkError;
use crate::layout::LayoutConfig;

/// An owner is grouped once it holds this many repos.
const OWNER_GROUP_MIN_REPOS: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrepareReport {
    pub dropped_links: usize,
    pub owner_groups: usize,
}

struct LinkDraft {
    source: String,
    target: String,
    owner: Option<String>,
    commit_count: u64,
    commit_sec_min: i64,
    commit_sec_max: i64,
}

/// Folds owner-routed links sharing `source~target` into one, keeping first-seen order.
#[derive(Default)]
struct LinkAggregate {
    drafts: Vec<LinkDraft>,
    slot_by_key: HashMap<(String, String), usize>,
}

impl LinkAggregate {
    fn add(&mut self, draft: LinkDraft) {
        let key = (draft.source.clone(), draft.target.clone());
        if let Some(&slot) = self.slot_by_key.get(&key) {
            let existing = &mut self.drafts[slot];
            existing.commit_count += draft.commit_count;
            existing.commit_sec_min = existing.commit_sec_min.min(draft.commit_sec_min);
            existing.commit_sec_max = existing.commit_sec_max.max(draft.commit_sec_max);
            return;
        }
        self.slot_by_key.insert(key, self.drafts.len());
        self.drafts.push(draft);
    }
}

/// Builds the typed network from raw rows.
pub fn prepare(
    raw: &RawNetwork,
    central_id: &str,
    config: &LayoutConfig,
) -> Result<(Network, PrepareReport), NetworkError> {
    let mut report = PrepareReport::default();
    let mut seen_ids = HashSet::new();

    let mut contributors = Vec::with_capacity(raw.contributors.len());
    for row in &raw.contributors {
        if !seen_ids.insert(row.name.clone()) {
            warn!(id = %row.name, "duplicate contributor row ignored");
            continue;
        }
        contributors.push(ContributorRecord {
            name: row.name.clone(),
            tier: row.tier.unwrap_or_default(),
            total_commits: 0,
            links_original: Vec::new(),
        });
    }

    let mut repos = Vec::with_capacity(raw.repos.len());
    for row in &raw.repos {
        let (owner, name) = parse_repo_string(&row.repo)?;
        if !seen_ids.insert(row.repo.clone()) {
            warn!(id = %row.repo, "duplicate repo row ignored");
            continue;
        }
        repos.push(RepoRecord {
            full_name: row.repo.clone(),
            owner: owner.to_owned(),
            name: name.to_owned(),
            stars: row.stars,
            forks: row.forks,
            languages: split_languages(&row.languages),
            multi_repo_owner: false,
            links_original: Vec::new(),
        });
    }

    let mut repos_per_owner: HashMap<&str, usize> = HashMap::new();
    for repo in &repos {
        *repos_per_owner.entry(repo.owner.as_str()).or_default() += 1;
    }

    let mut owners = Vec::new();
    for repo in &repos {
        if repos_per_owner.get(repo.owner.as_str()).copied().unwrap_or(0) < OWNER_GROUP_MIN_REPOS
            || owners.iter().any(|owner: &OwnerRecord| owner.name == repo.owner)
        {
            continue;
        }
        if seen_ids.contains(&repo.owner) {
            warn!(owner = %repo.owner, "owner id clashes with another node; repos left ungrouped");
            continue;
        }
        let owned = repos.iter().filter(|other| other.owner == repo.owner);
        let (names, stars, forks) = owned.fold(
            (Vec::new(), 0u64, 0u64),
            |(mut names, stars, forks), other| {
                names.push(other.name.clone());
                (names, stars + other.stars, forks + other.forks)
            },
        );
        owners.push(OwnerRecord {
            name: repo.owner.clone(),
            repos: names,
            stars,
            forks,
            single_contributor: false,
        });
    }
    owners.sort_by_key(|owner| owner.name.to_lowercase());
    report.owner_groups = owners.len();

    let grouped: HashSet<String> = owners.iter().map(|owner| owner.name.clone()).collect();
    for repo in &mut repos {
        repo.multi_repo_owner = grouped.contains(&repo.owner);
    }

    let mut direct = Vec::new();
    let mut owner_to_repo = LinkAggregate::default();
    let mut contributor_to_owner = LinkAggregate::default();
    let mut originals = Vec::with_capacity(raw.links.len());
    for row in &raw.links {
        let (owner, _name) = parse_repo_string(&row.repo)?;
        originals.push(OriginalLink {
            contributor: row.contributor.clone(),
            repo: row.repo.clone(),
            owner: owner.to_owned(),
        });

        let draft = |source: &str, target: &str, owner: Option<&str>| LinkDraft {
            source: source.to_owned(),
            target: target.to_owned(),
            owner: owner.map(str::to_owned),
            commit_count: row.commit_count,
            commit_sec_min: row.commit_sec_min,
            commit_sec_max: row.commit_sec_max,
        };

        if grouped.contains(owner) {
            owner_to_repo.add(draft(owner, &row.repo, Some(owner)));
            contributor_to_owner.add(draft(&row.contributor, owner, Some(owner)));
        } else {
            direct.push(draft(&row.contributor, &row.repo, None));
        }
    }

    for contributor in &mut contributors {
        contributor.links_original = originals
            .iter()
            .filter(|link| link.contributor == contributor.name)
            .cloned()
            .collect();
    }
    for repo in &mut repos {
        repo.links_original = originals
            .iter()
            .filter(|link| link.repo == repo.full_name)
            .cloned()
            .collect();
    }

    let node_ids: HashSet<&str> = contributors
        .iter()
        .map(|record| record.name.as_str())
        .chain(repos.iter().map(|record| record.full_name.as_str()))
        .chain(owners.iter().map(|record| record.name.as_str()))
        .collect();

    let mut drafts = Vec::new();
    for draft in direct
        .into_iter()
        .chain(owner_to_repo.drafts)
        .chain(contributor_to_owner.drafts)
    {
        if draft.source.trim().is_empty() || draft.target.trim().is_empty() {
            warn!(source = %draft.source, target = %draft.target, "dropping link with empty endpoint");
            report.dropped_links += 1;
            continue;
        }
        let source_exists = node_ids.contains(draft.source.as_str());
        let target_exists = node_ids.contains(draft.target.as_str());
        if !source_exists || !target_exists {
            warn!(
                source = %draft.source,
                target = %draft.target,
                source_exists,
                target_exists,
                "dropping link to unknown node"
            );
            report.dropped_links += 1;
            continue;
        }
        drafts.push(draft);
    }

    for owner in &mut owners {
        let incoming = drafts
            .iter()
            .filter(|draft| draft.target == owner.name)
            .count();
        owner.single_contributor = incoming == 1;
    }

    let mut commits_by_source: HashMap<&str, u64> = HashMap::new();
    for draft in &drafts {
        *commits_by_source.entry(draft.source.as_str()).or_default() += draft.commit_count;
    }
    for contributor in &mut contributors {
        contributor.total_commits = commits_by_source
            .get(contributor.name.as_str())
            .copied()
            .unwrap_or(0);
    }

    let scales = build_scales(&repos, &contributors, &drafts);

    let mut degree_by_id: HashMap<&str, usize> = HashMap::new();
    for draft in &drafts {
        *degree_by_id.entry(draft.source.as_str()).or_default() += 1;
        *degree_by_id.entry(draft.target.as_str()).or_default() += 1;
    }
    let degree_of = |id: &str| degree_by_id.get(id).copied().unwrap_or(0);

    let mut nodes = Vec::with_capacity(contributors.len() + repos.len() + owners.len());
    for record in &contributors {
        let mut node = Node::new(
            record.name.clone(),
            record.name.clone(),
            NodeData::Contributor(record.clone()),
        );
        node.r = if record.total_commits > 0 {
            scales.contributor_radius.apply(record.total_commits as f64)
        } else {
            scales.contributor_radius_floor()
        };
        node.degree = degree_of(&record.name);
        nodes.push(node);
    }
    for record in &repos {
        let mut node = Node::new(
            record.full_name.clone(),
            record.name.clone(),
            NodeData::Repo(record.clone()),
        );
        node.r = scales.repo_radius.apply(record.stars as f64);
        node.degree = degree_of(&record.full_name);
        nodes.push(node);
    }
    for record in &owners {
        let mut node = Node::new(
            record.name.clone(),
            record.name.clone(),
            NodeData::Owner(record.clone()),
        );
        node.r = scales.repo_radius.apply(record.stars as f64);
        node.degree = degree_of(&record.name);
        nodes.push(node);
    }

    if nodes.is_empty() {
        return Err(NetworkError::EmptyNetwork);
    }

    nodes.sort_by(|a, b| {
        a.kind().cmp(&b.kind()).then_with(|| match a.kind() {
            NodeKind::Contributor => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
            NodeKind::Owner | NodeKind::Repo => std::cmp::Ordering::Equal,
        })
    });

    let Some(central) = nodes.iter().position(|node| node.id == central_id) else {
        return Err(NetworkError::MissingCentralNode(central_id.to_owned()));
    };
    nodes[central].r = config.central_radius;

    let links = drafts
        .into_iter()
        .map(|draft| Link {
            source: LinkEndpoint::Id(draft.source),
            target: LinkEndpoint::Id(draft.target),
            commit_count: draft.commit_count,
            commit_sec_min: draft.commit_sec_min,
            commit_sec_max: draft.commit_sec_max,
            owner: draft.owner,
        })
        .collect::<Vec<_>>();

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        owners = report.owner_groups,
        dropped = report.dropped_links,
        "network prepared"
    );

    Ok((Network::new(nodes, links, central, scales), report))
}

fn build_scales(
    repos: &[RepoRecord],
    contributors: &[ContributorRecord],
    drafts: &[LinkDraft],
) -> Scales {
    let defaults = Scales::default();

    let repo_domain =
        extent(repos.iter().map(|repo| repo.stars as f64)).unwrap_or(defaults.repo_radius.domain);
    let contributor_domain = extent(
        contributors
            .iter()
            .filter(|contributor| contributor.total_commits > 0)
            .map(|contributor| contributor.total_commits as f64),
    )
    .unwrap_or(defaults.contributor_radius.domain);
    let max_commits = drafts
        .iter()
        .map(|draft| draft.commit_count)
        .max()
        .map(|max| max as f64)
        .unwrap_or(defaults.link_width.domain[2]);

    Scales {
        repo_radius: SqrtScale::new(repo_domain, defaults.repo_radius.range),
        contributor_radius: SqrtScale::new(contributor_domain, defaults.contributor_radius.range),
        link_width: PowScale {
            domain: [1.0, 10.0, max_commits],
            ..defaults.link_width
        },
        link_distance: defaults.link_distance,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::super::parse::{RawContributor, RawLink, RawRepo};
    use super::*;
    use crate::network::graph::Tier;

    pub(crate) fn contributor(name: &str, tier: Tier) -> RawContributor {
        RawContributor {
            name: name.to_owned(),
            tier: Some(tier),
        }
    }

    pub(crate) fn repo(full_name: &str, stars: u64) -> RawRepo {
        RawRepo {
            repo: full_name.to_owned(),
            stars,
            forks: stars / 4,
            languages: String::new(),
        }
    }

    pub(crate) fn link(contributor: &str, repo: &str, commits: u64) -> RawLink {
        RawLink {
            contributor: contributor.to_owned(),
            repo: repo.to_owned(),
            commit_count: commits,
            commit_sec_min: 1_600_000_000,
            commit_sec_max: 1_600_000_000 + commits as i64 * 3_600,
        }
    }

    /// A small network: two core contributors sharing the central repo, one
    /// owner with three single-contributor repos, and a community contributor.
    pub(crate) fn sample() -> RawNetwork {
        RawNetwork {
            central: Some("hub/core".to_owned()),
            contributors: vec![
                contributor("ada", Tier::Core),
                contributor("grace", Tier::Core),
                contributor("linus", Tier::Community),
            ],
            repos: vec![
                repo("hub/core", 500),
                repo("ada/notes", 3),
                repo("tools/a", 10),
                repo("tools/b", 20),
                repo("tools/c", 30),
                repo("misc/shared", 40),
            ],
            links: vec![
                link("ada", "hub/core", 40),
                link("grace", "hub/core", 25),
                link("linus", "hub/core", 1),
                link("ada", "ada/notes", 7),
                link("grace", "tools/a", 3),
                link("grace", "tools/b", 4),
                link("grace", "tools/c", 5),
                link("ada", "misc/shared", 2),
                link("grace", "misc/shared", 2),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::network::graph::Tier;

    fn prepared(raw: &RawNetwork) -> (Network, PrepareReport) {
        prepare(raw, "hub/core", &LayoutConfig::default()).unwrap()
    }

    #[test]
    fn groups_owners_with_three_repos() {
        let (network, report) = prepared(&sample());
        assert_eq!(report.owner_groups, 1);

        let owner = network.index_of("tools").unwrap();
        let NodeData::Owner(record) = &network.nodes[owner].data else {
            panic!("tools should be an owner");
        };
        assert_eq!(record.stars, 60);
        assert_eq!(record.repos, ["a", "b", "c"]);
        assert!(record.single_contributor);
        assert!(network.nodes[network.index_of("tools/a").unwrap()].has_multi_repo_owner());
        assert!(!network.nodes[network.index_of("misc/shared").unwrap()].has_multi_repo_owner());
    }

    #[test]
    fn owner_routing_replaces_direct_links() {
        let (network, _) = prepared(&sample());
        let names = network
            .links
            .iter()
            .map(|link| {
                (
                    link.source.node_id(&network.nodes).unwrap().to_owned(),
                    link.target.node_id(&network.nodes).unwrap().to_owned(),
                )
            })
            .collect::<Vec<_>>();

        assert!(!names.contains(&("grace".to_owned(), "tools/a".to_owned())));
        assert!(names.contains(&("tools".to_owned(), "tools/a".to_owned())));
        let to_owner = network
            .links
            .iter()
            .find(|link| link.target == LinkEndpoint::Id("tools".to_owned()))
            .unwrap();
        assert_eq!(to_owner.commit_count, 12);
        assert_eq!(to_owner.commit_sec_min, 1_600_000_000);
        assert_eq!(to_owner.commit_sec_max, 1_600_000_000 + 5 * 3_600);
    }

    #[test]
    fn drops_links_to_missing_nodes_by_exact_count() {
        let mut raw = sample();
        let (baseline, _) = prepared(&raw);
        raw.links.push(link("ada", "ghost/repo", 3));
        raw.links.push(link("nobody", "hub/core", 1));

        let (network, report) = prepared(&raw);
        assert_eq!(report.dropped_links, 2);
        assert_eq!(network.links.len(), baseline.links.len());
    }

    #[test]
    fn degrees_radii_and_ordering() {
        let (network, _) = prepared(&sample());
        let kinds = network.nodes.iter().map(Node::kind).collect::<Vec<_>>();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
        assert_eq!(network.nodes[0].id, "ada");

        let central = network.central_node();
        assert_eq!(central.id, "hub/core");
        assert_eq!(central.r, LayoutConfig::default().central_radius);
        assert_eq!(central.degree, 3);

        let linus = &network.nodes[network.index_of("linus").unwrap()];
        assert_eq!(linus.tier(), Some(Tier::Community));
        assert_eq!(linus.r, 8.0);
        let ada = &network.nodes[network.index_of("ada").unwrap()];
        assert_eq!(ada.r, 30.0);
    }

    #[test]
    fn missing_central_is_an_error() {
        let result = prepare(&sample(), "hub/absent", &LayoutConfig::default());
        assert!(matches!(result, Err(NetworkError::MissingCentralNode(id)) if id == "hub/absent"));
    }

    #[test]
    fn invalid_repo_string_is_an_error() {
        let mut raw = sample();
        raw.repos.push(repo("noslash", 1));
        assert!(matches!(
            prepare(&raw, "hub/core", &LayoutConfig::default()),
            Err(NetworkError::InvalidRepoName(_))
        ));
    }
}
