//! Legacy `repositories` file handling
//!
//! The file is a JSON object `{ repository: { tag: reference } }` present in every
//! Docker image archive layout (v1, v1.1 and v1.2).

use crate::common::{RepoTagUtils, RepositoryEdit};
use crate::error::Result;
use crate::image::migration::RegistryMigration;
use crate::logging::Logger;
use serde::Serialize;
use std::collections::BTreeMap;

/// Archive entry name of the legacy metadata file
pub const REPOSITORIES_ENTRY: &str = "repositories";

/// Tag name -> content reference (image ID or digest)
pub type TagMap = BTreeMap<String, String>;

/// Repository -> tag -> reference
///
/// Ordered maps keep serialization stable: keys come out sorted, matching what
/// `docker save` writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepositoryMap {
    repositories: BTreeMap<String, TagMap>,
}

impl RepositoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the raw body of a `repositories` entry
    ///
    /// A `null` body or tag map decodes as empty.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw: Option<BTreeMap<String, Option<TagMap>>> = serde_json::from_slice(data)?;
        let repositories = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(repository, tags)| (repository, tags.unwrap_or_default()))
            .collect();
        Ok(Self { repositories })
    }

    /// Compact JSON encoding
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Insert or replace the tags of a repository, returning the previous tags
    pub fn insert(&mut self, repository: impl Into<String>, tags: TagMap) -> Option<TagMap> {
        self.repositories.insert(repository.into(), tags)
    }

    pub fn get(&self, repository: &str) -> Option<&TagMap> {
        self.repositories.get(repository)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Flatten into `repository:tag` strings
    pub fn repo_tags(&self) -> Vec<String> {
        self.repositories
            .iter()
            .flat_map(|(repository, tags)| {
                tags.keys()
                    .map(move |tag| RepoTagUtils::join(repository, Some(tag)))
            })
            .collect()
    }
}

/// Rewrite every repository key of a raw `repositories` body
///
/// The migration runs before `edit`. Tag maps move unchanged to the new key. When two
/// repositories end up with the same name, the later one (in key order) wins.
pub fn edit_repositories_file(
    raw: &[u8],
    edit: &dyn RepositoryEdit,
    migration: &RegistryMigration,
    logger: &Logger,
) -> Result<Vec<u8>> {
    let parsed = RepositoryMap::parse(raw)?;

    let mut fixed = RepositoryMap::new();
    for (repository, tags) in parsed.repositories {
        let migrated = migration.apply(&repository);
        let renamed = edit.edit(&migrated);
        if renamed != repository {
            logger.detail(&format!("repositories: {} -> {}", repository, renamed));
        }
        if fixed.insert(renamed.clone(), tags).is_some() {
            logger.warning(&format!(
                "repository {} collides with an earlier entry; keeping the tags of {}",
                renamed, repository
            ));
        }
    }

    fixed.to_vec()
}
