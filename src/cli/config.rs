//! Rewrite configuration
//!
//! Collected from CLI flags with environment fallbacks, and validated before any
//! archive is opened.

use crate::cli::args::{Args, Command};
use crate::common::{EditChain, PrefixRewrite, SuffixStrip, ValidationUtils};
use crate::error::Result;
use crate::image::RegistryMigration;

pub const ENV_KUBEADM_VERSION: &str = "ARCHIVE_RETAG_KUBEADM_VERSION";
pub const ENV_VERBOSE: &str = "ARCHIVE_RETAG_VERBOSE";

/// Settings that shape a rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetagConfig {
    pub kubeadm_version: Option<String>,
    pub replacements: Vec<(String, String)>,
    pub strip_suffix: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
}

impl RetagConfig {
    /// Build from parsed arguments; `FROM=TO` values are checked here
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = Self {
            verbose: args.verbose,
            quiet: args.quiet,
            ..Self::default()
        };

        if let Command::Retag {
            replace,
            strip_suffix,
            kubeadm_version,
            ..
        } = &args.command
        {
            config.replacements = replace
                .iter()
                .map(|value| ValidationUtils::parse_replacement(value))
                .collect::<Result<Vec<_>>>()?;
            config.strip_suffix = strip_suffix.clone();
            config.kubeadm_version = kubeadm_version.clone();
        }

        Ok(config)
    }

    /// Fill unset values from environment variables
    pub fn from_env(self) -> Self {
        self.merge_env(|key| std::env::var(key).ok())
    }

    fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.kubeadm_version.is_none() {
            self.kubeadm_version = lookup(ENV_KUBEADM_VERSION).filter(|v| !v.is_empty());
        }
        if lookup(ENV_VERBOSE).is_some() && !self.quiet {
            self.verbose = true;
        }
        self
    }

    /// Registry migration for the configured kubeadm version
    ///
    /// An unparseable version is a configuration error.
    pub fn migration(&self) -> Result<RegistryMigration> {
        RegistryMigration::new(self.kubeadm_version.as_deref())
    }

    /// Repository editor: suffix strip first, then prefix replacements in order
    pub fn editor(&self) -> EditChain {
        let mut chain = EditChain::new();
        if let Some(suffix) = &self.strip_suffix {
            chain = chain.push(SuffixStrip::new(suffix.clone()));
        }
        for (from, to) in &self.replacements {
            chain = chain.push(PrefixRewrite::new(from.clone(), to.clone()));
        }
        chain
    }

    pub fn validate(&self) -> Result<()> {
        self.migration()?;
        if let Some(suffix) = &self.strip_suffix {
            ValidationUtils::validate_repository_prefix(suffix)?;
        }
        Ok(())
    }
}
