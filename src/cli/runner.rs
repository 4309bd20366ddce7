//! Runner for the `tags` and `retag` commands

use crate::cli::args::{Args, Command};
use crate::cli::config::RetagConfig;
use crate::common::{RepositoryEdit, Timer};
use crate::error::{ArchiveError, Result};
use crate::image::{RewriteStats, TarHandler};
use crate::logging::Logger;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

pub struct Runner {
    args: Args,
    config: RetagConfig,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        args.validate().map_err(ArchiveError::Configuration)?;
        let config = RetagConfig::from_args(&args)?.from_env();
        config.validate()?;

        let logger = if config.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(config.verbose)
        };

        Ok(Self {
            args,
            config,
            logger,
        })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn run(&self) -> Result<()> {
        match &self.args.command {
            Command::Tags { archive } => {
                let tags = self.list_tags(Path::new(archive))?;
                let stdout = io::stdout();
                let mut out = stdout.lock();
                for tag in tags {
                    writeln!(out, "{}", tag)?;
                }
                out.flush()?;
                Ok(())
            }
            Command::Retag { input, output, .. } => {
                let stats = self.retag(input, output)?;
                self.logger.summary_kv(
                    "Rewrite summary",
                    &[
                        ("Entries copied", stats.entries.to_string()),
                        ("Metadata entries edited", stats.edited.to_string()),
                        ("Bytes read", self.logger.format_size(stats.bytes_in)),
                        ("Bytes written", self.logger.format_size(stats.bytes_out)),
                        (
                            "Total time",
                            self.logger.format_duration(self.logger.elapsed()),
                        ),
                    ],
                );
                Ok(())
            }
        }
    }

    /// List tags of the archive at `path`
    pub fn list_tags(&self, path: &Path) -> Result<Vec<String>> {
        let timer = Timer::start("Tag listing");
        let tags = TarHandler::new(self.logger.clone()).list_tags(path)?;
        timer.log_elapsed(&self.logger);
        Ok(tags)
    }

    /// Rewrite `input` into `output`; `-` selects stdin / stdout
    pub fn retag(&self, input: &str, output: &str) -> Result<RewriteStats> {
        self.logger.section("Image Archive Retag");
        let migration = self.config.migration()?;
        if let Some(version) = migration.kubeadm_version() {
            self.logger.info(&format!(
                "kubeadm {}: k8s.gcr.io migration {}",
                version,
                if migration.is_active() { "enabled" } else { "not needed" }
            ));
        }

        let editor = self.config.editor();
        if editor.is_empty() {
            self.logger
                .warning("No repository edits configured; only the registry migration applies");
        }

        self.logger.step(&format!("Rewriting {} -> {}", display(input), display(output)));
        let timer = Timer::start("Archive rewrite");
        let handler = TarHandler::new(self.logger.clone()).with_migration(migration);
        let stats = stream(&handler, input, output, &editor)?;
        timer.log_elapsed(&self.logger);

        self.logger.success(&format!(
            "Rewrote {} of {} entries",
            stats.edited, stats.entries
        ));
        Ok(stats)
    }
}

fn stream(
    handler: &TarHandler,
    input: &str,
    output: &str,
    edit: &dyn RepositoryEdit,
) -> Result<RewriteStats> {
    let reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(input)?))
    };
    let writer: Box<dyn Write> = if output == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(BufWriter::new(File::create(output)?))
    };
    handler.edit_repositories(reader, writer, edit)
}

fn display(path: &str) -> &str {
    if path == "-" { "<stdio>" } else { path }
}
