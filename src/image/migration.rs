//! Legacy registry migration
//!
//! kubeadm 1.22 and later pull control plane images from `registry.k8s.io` instead of
//! `k8s.gcr.io`. When the kubeadm binary version is known and new enough, repository
//! names on the old host are moved to the new one so that preloaded images match what
//! kubeadm expects.

use crate::error::Result;
use semver::Version;

pub const LEGACY_REGISTRY: &str = "k8s.gcr.io";
pub const SUCCESSOR_REGISTRY: &str = "registry.k8s.io";

/// First kubeadm release (any pre-release included) that uses the successor registry
pub const MIGRATION_THRESHOLD: &str = "1.22.0-0";

/// Version-gated `k8s.gcr.io` -> `registry.k8s.io` rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMigration {
    kubeadm_version: Option<Version>,
}

impl RegistryMigration {
    /// Build from the known kubeadm binary version
    ///
    /// `None` or an empty string disables the rewrite. A leading `v` is accepted.
    pub fn new(kubeadm_version: Option<&str>) -> Result<Self> {
        let kubeadm_version = match kubeadm_version.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_version(raw)?),
        };
        Ok(Self { kubeadm_version })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn kubeadm_version(&self) -> Option<&Version> {
        self.kubeadm_version.as_ref()
    }

    /// Whether the configured version is at or past the migration release
    pub fn is_active(&self) -> bool {
        match &self.kubeadm_version {
            Some(version) => threshold_reached(version),
            None => false,
        }
    }

    /// Rewrite `repository` when active and it lives on the legacy registry
    pub fn apply(&self, repository: &str) -> String {
        if self.is_active() && repository.starts_with(LEGACY_REGISTRY) {
            repository.replace(LEGACY_REGISTRY, SUCCESSOR_REGISTRY)
        } else {
            repository.to_string()
        }
    }
}

fn parse_version(raw: &str) -> Result<Version> {
    let stripped = raw.strip_prefix('v').unwrap_or(raw);
    Ok(Version::parse(stripped)?)
}

/// `1.22.0-0` is the lowest version in the 1.22.0 line, so the core triple decides.
fn threshold_reached(version: &Version) -> bool {
    (version.major, version.minor, version.patch) >= (1, 22, 0)
}
