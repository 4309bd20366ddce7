//! `manifest.json` handling for v1.1 / v1.2 Docker image archives

use crate::common::{RepoTagUtils, RepositoryEdit};
use crate::error::Result;
use crate::image::migration::RegistryMigration;
use crate::logging::Logger;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Archive entry name of the per-image manifest list
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// One image record of `manifest.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "Config", default, deserialize_with = "null_as_default")]
    pub config: String,
    /// `repository:tag` labels; `null` for untagged images
    #[serde(rename = "RepoTags", default, deserialize_with = "null_as_default")]
    pub repo_tags: Vec<String>,
    /// `null` for images without layers
    #[serde(rename = "Layers", default, deserialize_with = "null_as_default")]
    pub layers: Vec<String>,
    /// Any other field (`Parent`, `LayerSources`, ...) passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// docker encodes nil slices and unset strings as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ManifestEntry {
    /// Rewrite the repository part of every repo tag, keeping tags and order
    ///
    /// `edit` runs first, then the registry migration.
    pub fn edit_repositories(
        &mut self,
        edit: &dyn RepositoryEdit,
        migration: &RegistryMigration,
    ) -> Result<()> {
        let fixed = self
            .repo_tags
            .iter()
            .map(|repo_tag| {
                let (repository, tag) = RepoTagUtils::split(repo_tag)?;
                let repository = migration.apply(&edit.edit(repository));
                Ok(RepoTagUtils::join(&repository, tag))
            })
            .collect::<Result<Vec<_>>>()?;
        self.repo_tags = fixed;
        Ok(())
    }
}

/// Decode a raw `manifest.json` body
pub fn parse_manifest(raw: &[u8]) -> Result<Vec<ManifestEntry>> {
    Ok(serde_json::from_slice(raw)?)
}

/// Rewrite the repo tags of a raw `manifest.json` body
pub fn edit_manifest(
    raw: &[u8],
    edit: &dyn RepositoryEdit,
    migration: &RegistryMigration,
    logger: &Logger,
) -> Result<Vec<u8>> {
    let mut entries = parse_manifest(raw)?;

    for entry in entries.iter_mut() {
        let before = entry.repo_tags.clone();
        entry.edit_repositories(edit, migration)?;
        for (old, new) in before.iter().zip(&entry.repo_tags) {
            if old != new {
                logger.detail(&format!("manifest.json: {} -> {}", old, new));
            }
        }
    }

    Ok(serde_json::to_vec(&entries)?)
}
