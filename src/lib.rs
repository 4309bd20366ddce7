//! Image Archive Retag Library
//!
//! Lists and rewrites the repository tags stored in Docker image archive tarballs
//! without touching layers or configs.

pub mod cli;
pub mod common;
pub mod error;
pub mod image;
pub mod logging;

pub use common::RepositoryEdit;
pub use error::{ArchiveError, Result};
pub use image::{RegistryMigration, RewriteStats, TarHandler};

use logging::Logger;
use std::io::{Read, Write};
use std::path::Path;

/// List the `repository:tag` labels of the archive at `path`
///
/// Order is unspecified.
pub fn get_archive_tags(path: impl AsRef<Path>) -> Result<Vec<String>> {
    TarHandler::new(Logger::new_quiet()).list_tags(path.as_ref())
}

/// Stream an archive from `reader` to `writer`, rewriting image repositories with `edit`
///
/// `migration` carries the known kubeadm version for the `k8s.gcr.io` move; pass
/// [`RegistryMigration::disabled`] when it does not apply.
pub fn edit_archive_repositories<R: Read, W: Write>(
    reader: R,
    writer: W,
    edit: &dyn RepositoryEdit,
    migration: RegistryMigration,
) -> Result<RewriteStats> {
    TarHandler::new(Logger::new_quiet())
        .with_migration(migration)
        .edit_repositories(reader, writer, edit)
}
