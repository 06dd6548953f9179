use std::collections::HashSet;

use tracing::debug;

use super::parse::RawNetwork;
use crate::util::owner_of;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub organizations: Vec<String>,
    pub stars_min: Option<u64>,
    pub forks_min: Option<u64>,
}

impl Filters {
    pub fn is_active(&self) -> bool {
        !self.organizations.is_empty() || self.stars_min.is_some() || self.forks_min.is_some()
    }

    pub fn set_organization(&mut self, organization: &str, active: bool) {
        let present = self.organizations.iter().any(|org| org == organization);
        if active && !present {
            self.organizations.push(organization.to_owned());
        } else if !active {
            self.organizations.retain(|org| org != organization);
        }
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// Visible subset of `raw`. The central repo survives the organization filter.
    pub fn apply(&self, raw: &RawNetwork, central: Option<&str>) -> RawNetwork {
        let repos = raw
            .repos
            .iter()
            .filter(|repo| {
                self.organizations.is_empty()
                    || central == Some(repo.repo.as_str())
                    || self
                        .organizations
                        .iter()
                        .any(|org| org == owner_of(&repo.repo))
            })
            .filter(|repo| self.stars_min.is_none_or(|min| repo.stars >= min))
            .filter(|repo| self.forks_min.is_none_or(|min| repo.forks >= min))
            .cloned()
            .collect::<Vec<_>>();

        let visible_repos: HashSet<&str> = repos.iter().map(|repo| repo.repo.as_str()).collect();
        let repo_links = raw
            .links
            .iter()
            .filter(|link| visible_repos.contains(link.repo.as_str()))
            .collect::<Vec<_>>();

        let linked: HashSet<&str> = repo_links
            .iter()
            .map(|link| link.contributor.as_str())
            .collect();
        let contributors = raw
            .contributors
            .iter()
            .filter(|contributor| linked.contains(contributor.name.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        let visible_contributors: HashSet<&str> = contributors
            .iter()
            .map(|contributor| contributor.name.as_str())
            .collect();
        let links = repo_links
            .into_iter()
            .filter(|link| visible_contributors.contains(link.contributor.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        debug!(
            contributors = contributors.len(),
            repos = repos.len(),
            links = links.len(),
            "filters applied"
        );

        RawNetwork {
            central: raw.central.clone(),
            contributors,
            repos,
            links,
        }
    }
}

/// Distinct repo owners, sorted case-insensitively.
pub fn organizations(raw: &RawNetwork) -> Vec<String> {
    let mut owners = raw
        .repos
        .iter()
        .map(|repo| owner_of(&repo.repo).to_owned())
        .collect::<Vec<_>>();
    owners.sort_by_key(|owner| owner.to_lowercase());
    owners.dedup();
    owners
}
