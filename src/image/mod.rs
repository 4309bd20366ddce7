//! Docker image archive metadata
//!
//! This module reads and rewrites the two metadata records of Docker image tarballs
//! (image spec v1, v1.1 and v1.2):
//!
//! - `repositories`: `{ repository: { tag: reference } }`, present in every layout
//! - `manifest.json`: a list of `{ Config, RepoTags, Layers }` records (v1.1+)
//!
//! # Examples
//!
//! Moving every image of an archive to a mirror registry:
//!
//! ```no_run
//! use std::fs::File;
//! use image_archive_retag::common::PrefixRewrite;
//! use image_archive_retag::image::{RegistryMigration, TarHandler};
//! use image_archive_retag::logging::Logger;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = TarHandler::new(Logger::new(false))
//!     .with_migration(RegistryMigration::new(Some("v1.24.0"))?);
//! let input = File::open("images.tar")?;
//! let output = File::create("images-mirrored.tar")?;
//! handler.edit_repositories(input, output, &PrefixRewrite::new("docker.io", "mirror.local"))?;
//! # Ok(())
//! # }
//! ```

pub mod manifest;
pub mod migration;
pub mod repositories;
pub mod tar_handler;

pub use manifest::{ManifestEntry, edit_manifest, parse_manifest};
pub use migration::RegistryMigration;
pub use repositories::{RepositoryMap, TagMap, edit_repositories_file};
pub use tar_handler::{RewriteStats, TarHandler};
