use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::graph::Tier;
use crate::error::NetworkError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNetwork {
    /// Central repository id, if the file names one.
    #[serde(default)]
    pub central: Option<String>,
    #[serde(default)]
    pub contributors: Vec<RawContributor>,
    #[serde(default)]
    pub repos: Vec<RawRepo>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawContributor {
    #[serde(rename = "author_name")]
    pub name: String,
    #[serde(default)]
    pub tier: Option<Tier>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawRepo {
    pub repo: String,
    #[serde(default, rename = "repo_stars")]
    pub stars: u64,
    #[serde(default, rename = "repo_forks")]
    pub forks: u64,
    #[serde(default, rename = "repo_languages")]
    pub languages: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawLink {
    #[serde(rename = "author_name")]
    pub contributor: String,
    pub repo: String,
    #[serde(default)]
    pub commit_count: u64,
    #[serde(default)]
    pub commit_sec_min: i64,
    #[serde(default)]
    pub commit_sec_max: i64,
}

pub fn parse_raw_network(raw: &str) -> Result<RawNetwork, NetworkError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_raw_network(path: &Path) -> Result<RawNetwork, NetworkError> {
    let raw = fs::read_to_string(path)?;
    parse_raw_network(&raw)
}

/// Splits `owner/name`, rejecting a missing slash or an empty side.
pub fn parse_repo_string(repo: &str) -> Result<(&str, &str), NetworkError> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(NetworkError::InvalidRepoName(repo.to_owned())),
    }
}

pub(super) fn split_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|language| !language.is_empty())
        .map(str::to_owned)
        .collect()
}
