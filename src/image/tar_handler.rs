//! Tar archive operations
//!
//! Reading repo tags out of an image archive and streaming an archive through a
//! repository rewrite. Supports v1 / v1.1 / v1.2 Docker image archives, which all
//! carry a top-level `repositories` entry, and v1.1+ which add `manifest.json`.

use crate::common::{ArchiveUtils, RepositoryEdit};
use crate::error::{ArchiveError, Result};
use crate::image::manifest::{MANIFEST_ENTRY, edit_manifest};
use crate::image::migration::RegistryMigration;
use crate::image::repositories::{REPOSITORIES_ENTRY, RepositoryMap, edit_repositories_file};
use crate::logging::Logger;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::rc::Rc;
use tar::{Archive, Header};

/// Counters reported by [`TarHandler::edit_repositories`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Records copied, including the edited ones
    pub entries: usize,
    /// Metadata records (`repositories`, `manifest.json`) that were rewritten
    pub edited: usize,
    /// Body bytes read from the input
    pub bytes_in: u64,
    /// Body bytes written to the output
    pub bytes_out: u64,
}

/// Tar handler for Docker image archives
pub struct TarHandler {
    logger: Logger,
    migration: RegistryMigration,
}

impl TarHandler {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            migration: RegistryMigration::disabled(),
        }
    }

    /// Use a registry migration while rewriting
    pub fn with_migration(mut self, migration: RegistryMigration) -> Self {
        self.migration = migration;
        self
    }

    /// List `repository:tag` labels from the archive at `tar_path`
    ///
    /// Order is unspecified.
    pub fn list_tags(&self, tar_path: &Path) -> Result<Vec<String>> {
        let file = File::open(tar_path)?;
        self.logger
            .detail(&format!("Reading repositories from {}", tar_path.display()));
        self.list_tags_from_reader(file)
    }

    /// List `repository:tag` labels from an archive stream (plain or gzip compressed)
    pub fn list_tags_from_reader<R: Read>(&self, reader: R) -> Result<Vec<String>> {
        let (reader, source) = SourceReader::new(reader);
        let reader = ArchiveUtils::decompress_if_gzipped(reader)?;
        let mut archive = Archive::new(reader);

        for entry_result in archive
            .entries()
            .map_err(|e| tar_error("Failed to read tar entries", e, &source))?
        {
            let mut entry =
                entry_result.map_err(|e| tar_error("Failed to read tar entry", e, &source))?;
            if &*entry.path_bytes() != REPOSITORIES_ENTRY.as_bytes() {
                continue;
            }

            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            let repositories = RepositoryMap::parse(&data)?;
            let tags = repositories.repo_tags();
            self.logger.detail(&format!(
                "Found {} tags across {} repositories",
                tags.len(),
                repositories.len()
            ));
            return Ok(tags);
        }

        Err(ArchiveError::NotFound(
            "could not find image metadata".to_string(),
        ))
    }

    /// Copy an archive from `reader` to `writer`, rewriting image repositories
    ///
    /// Only the `repositories` and `manifest.json` records change; every other header
    /// and body is written back as read, in the same order. Long-name and PAX records
    /// are copied as ordinary records. A failure aborts the copy and leaves whatever
    /// was already written in `writer`.
    pub fn edit_repositories<R: Read, W: Write>(
        &self,
        reader: R,
        writer: W,
        edit: &dyn RepositoryEdit,
    ) -> Result<RewriteStats> {
        let (reader, source) = SourceReader::new(reader);
        let mut archive = Archive::new(reader);
        let mut records = RecordWriter::new(writer);
        let mut stats = RewriteStats::default();

        let entries = archive
            .entries()
            .map_err(|e| tar_error("Failed to read tar entries", e, &source))?
            .raw(true);

        for entry_result in entries {
            let mut entry =
                entry_result.map_err(|e| tar_error("Failed to read tar entry", e, &source))?;
            let mut header = entry.header().clone();
            let name = entry.path_bytes().into_owned();

            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            stats.bytes_in += data.len() as u64;

            let edited = if name == REPOSITORIES_ENTRY.as_bytes() {
                Some(edit_repositories_file(
                    &data,
                    edit,
                    &self.migration,
                    &self.logger,
                )?)
            } else if name == MANIFEST_ENTRY.as_bytes() {
                Some(edit_manifest(&data, edit, &self.migration, &self.logger)?)
            } else {
                None
            };

            if let Some(body) = edited {
                self.logger.detail(&format!(
                    "Rewrote {} ({} -> {})",
                    String::from_utf8_lossy(&name),
                    self.logger.format_size(data.len() as u64),
                    self.logger.format_size(body.len() as u64)
                ));
                header.set_size(body.len() as u64);
                header.set_cksum();
                data = body;
                stats.edited += 1;
            }

            records.append(&header, &data)?;
            stats.entries += 1;
            stats.bytes_out += data.len() as u64;
        }

        records.finish()?;
        Ok(stats)
    }
}

const BLOCK_SIZE: usize = 512;

/// Writes tar records exactly as given
///
/// The end-of-archive marker is only written by [`RecordWriter::finish`], so an
/// aborted rewrite never produces a terminated archive.
struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Header block, then the body padded to a block boundary (nothing for empty bodies)
    fn append(&mut self, header: &Header, body: &[u8]) -> io::Result<()> {
        self.inner.write_all(header.as_bytes())?;
        if body.is_empty() {
            return Ok(());
        }
        self.inner.write_all(body)?;
        let remainder = body.len() % BLOCK_SIZE;
        if remainder != 0 {
            self.inner.write_all(&[0u8; BLOCK_SIZE][..BLOCK_SIZE - remainder])?;
        }
        Ok(())
    }

    /// Two zero blocks terminate the archive
    fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(&[0u8; BLOCK_SIZE * 2])?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Set once the wrapped stream has returned an error
type SourceFailed = Rc<Cell<bool>>;

/// Reader that records failures of the caller's stream
///
/// The tar crate reports corrupt headers as `ErrorKind::Other`, the same kind many
/// readers use for their own failures. The flag tells the two apart.
struct SourceReader<R> {
    inner: R,
    failed: SourceFailed,
}

impl<R: Read> SourceReader<R> {
    fn new(inner: R) -> (Self, SourceFailed) {
        let failed = SourceFailed::default();
        (
            Self {
                inner,
                failed: failed.clone(),
            },
            failed,
        )
    }
}

impl<R: Read> Read for SourceReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        if let Err(e) = &result {
            if e.kind() != io::ErrorKind::Interrupted {
                self.failed.set(true);
            }
        }
        result
    }
}

/// Corrupt tar structure is malformed input; a failing source stays an IO error
fn tar_error(context: &str, err: io::Error, source: &SourceFailed) -> ArchiveError {
    if source.get() {
        return ArchiveError::Io(err);
    }
    match err.kind() {
        io::ErrorKind::Other | io::ErrorKind::InvalidData => {
            ArchiveError::Malformed(format!("{}: {}", context, err))
        }
        _ => ArchiveError::Io(err),
    }
}
